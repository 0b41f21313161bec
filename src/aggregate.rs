use std::collections::{HashMap, HashSet};

use crate::models::{
    ActionCount, AssessmentKind, Event, ScoreRow, ScoreTable, SuccessfulCounts,
};

/// Every (category, verb) pair present in a normalized log.
///
/// Categories keep first-seen order and verbs keep first-seen order within their
/// category, so the action table has the same shape and tie order for any entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    pairs: Vec<(String, String)>,
}

impl Vocabulary {
    pub fn from_events(events: &[Event]) -> Self {
        let mut categories: Vec<(&str, Vec<&str>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();

        for event in events {
            let category = event.object_category.as_str();
            let verb = event.verb.as_str();
            if !seen.insert((category, verb)) {
                continue;
            }
            let slot = *index.entry(category).or_insert_with(|| {
                categories.push((category, Vec::new()));
                categories.len() - 1
            });
            categories[slot].1.push(verb);
        }

        let pairs = categories
            .into_iter()
            .flat_map(|(category, verbs)| {
                verbs
                    .into_iter()
                    .map(move |verb| (category.to_string(), verb.to_string()))
            })
            .collect();

        Self { pairs }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// How the successful-assessment counter treats the `success` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuccessCounting {
    /// Every row matching the (category, verb) pair counts, whatever its outcome.
    #[default]
    MatchedRows,
    /// Only rows with `success == true` count.
    SuccessfulOnly,
}

/// Pairs counted as successful assessments, in report order.
pub const SUCCESS_PAIRS: [(&str, &str); 3] = [
    ("quiz", "completed"),
    ("homework", "scored"),
    ("test", "completed"),
];

/// Counts every vocabulary pair in `entity`, zero included, sorted by count descending.
pub fn aggregate_actions(entity: &[Event], vocabulary: &Vocabulary) -> Vec<ActionCount> {
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for event in entity {
        *counts
            .entry((event.object_category.as_str(), event.verb.as_str()))
            .or_insert(0) += 1;
    }

    let mut actions: Vec<ActionCount> = vocabulary
        .pairs()
        .iter()
        .map(|(category, verb)| ActionCount {
            category: category.clone(),
            verb: verb.clone(),
            count: counts
                .get(&(category.as_str(), verb.as_str()))
                .copied()
                .unwrap_or(0),
        })
        .collect();

    // stable: ties keep vocabulary order
    actions.sort_by(|a, b| b.count.cmp(&a.count));
    actions
}

pub fn score_row(entity: &[Event], kind: AssessmentKind) -> ScoreRow {
    let scores: Vec<f64> = entity
        .iter()
        .filter(|event| event.matches(kind.category(), kind.scoring_verb()))
        .filter_map(|event| event.score_scaled)
        .filter(|score| !score.is_nan())
        .collect();

    if scores.is_empty() {
        return ScoreRow::undefined(kind);
    }

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;

    ScoreRow {
        kind,
        min: Some(min),
        avg: Some(avg),
        max: Some(max),
    }
}

pub fn aggregate_scores(entity: &[Event]) -> ScoreTable {
    ScoreTable {
        rows: AssessmentKind::ALL
            .iter()
            .map(|kind| score_row(entity, *kind))
            .collect(),
    }
}

pub fn count_successful(
    entity: &[Event],
    category: &str,
    verb: &str,
    counting: SuccessCounting,
) -> usize {
    entity
        .iter()
        .filter(|event| event.matches(category, verb))
        .filter(|event| match counting {
            SuccessCounting::MatchedRows => true,
            SuccessCounting::SuccessfulOnly => event.success == Some(true),
        })
        .count()
}

pub fn successful_counts(entity: &[Event], counting: SuccessCounting) -> SuccessfulCounts {
    let [quiz, homework, test] =
        SUCCESS_PAIRS.map(|(category, verb)| count_successful(entity, category, verb, counting));
    SuccessfulCounts {
        quiz,
        homework,
        test,
    }
}

/// Rows of `(category, numerator)` over rows of `(category, denominator)`.
pub fn verb_ratio(entity: &[Event], category: &str, numerator: &str, denominator: &str) -> Option<f64> {
    let below = entity
        .iter()
        .filter(|event| event.matches(category, denominator))
        .count();
    if below == 0 {
        return None;
    }
    let above = entity
        .iter()
        .filter(|event| event.matches(category, numerator))
        .count();
    Some(above as f64 / below as f64)
}

use std::collections::HashMap;

use rayon::prelude::*;

use crate::models::{ActorId, Event};

/// Categories whose rows feed the ranking score.
pub const GRADED_CATEGORIES: [&str; 3] = ["homework", "quiz", "test"];

/// Score used for an actor that has no entry in the population being ranked.
pub const MISSING_ACTOR_SCORE: f64 = 0.0;

pub fn is_graded(event: &Event) -> bool {
    GRADED_CATEGORIES.contains(&event.object_category.as_str())
}

/// Success-weighted performance of a set of graded rows.
///
/// Only rows with `success == true` count, a missing score counts as zero, and the
/// mean is floored at zero. No successful rows means a score of zero.
pub fn score<'a, I>(rows: I) -> f64
where
    I: IntoIterator<Item = &'a Event>,
{
    let (total, count) = rows
        .into_iter()
        .filter(|event| event.success == Some(true))
        .map(|event| event.score_scaled.filter(|value| !value.is_nan()).unwrap_or(0.0))
        .fold((0.0, 0usize), |(total, count), value| (total + value, count + 1));

    if count == 0 {
        return 0.0;
    }

    let mean = total / count as f64;
    if mean > 0.0 {
        mean
    } else {
        0.0
    }
}

/// Ranking score of every actor in a normalized log, computed over each actor's graded rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBoard {
    scores: HashMap<ActorId, f64>,
}

impl ScoreBoard {
    pub fn build(events: &[Event], parallel_threshold: usize) -> Self {
        let mut graded: HashMap<ActorId, Vec<&Event>> = HashMap::new();
        for event in events {
            let rows = graded.entry(event.actor_id).or_default();
            if is_graded(event) {
                rows.push(event);
            }
        }

        let scores = if graded.len() >= parallel_threshold {
            graded
                .into_par_iter()
                .map(|(actor_id, rows)| (actor_id, score(rows)))
                .collect()
        } else {
            graded
                .into_iter()
                .map(|(actor_id, rows)| (actor_id, score(rows)))
                .collect()
        };

        Self { scores }
    }

    pub fn get(&self, actor_id: ActorId) -> Option<f64> {
        self.scores.get(&actor_id).copied()
    }

    pub fn score_or_default(&self, actor_id: ActorId) -> f64 {
        self.get(actor_id).unwrap_or(MISSING_ACTOR_SCORE)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

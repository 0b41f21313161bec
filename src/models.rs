use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type ActorId = i64;

/// One interaction record from the xAPI-style log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub actor_id: ActorId,
    pub verb: String,
    pub object_category: String,
    pub score_scaled: Option<f64>,
    pub success: Option<bool>,
    pub timestamp: DateTime<Utc>,
    pub course: String,
    pub institution: String,
}

impl Event {
    pub fn matches(&self, category: &str, verb: &str) -> bool {
        self.object_category == category && self.verb == verb
    }
}

/// Assessment types reported in the score table, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Homework,
    Test,
    Quiz,
}

impl AssessmentKind {
    pub const ALL: [AssessmentKind; 3] = [Self::Homework, Self::Test, Self::Quiz];

    pub fn category(self) -> &'static str {
        match self {
            Self::Homework => "homework",
            Self::Test => "test",
            Self::Quiz => "quiz",
        }
    }

    /// The verb whose rows carry the graded score for this kind.
    pub fn scoring_verb(self) -> &'static str {
        match self {
            Self::Homework => "scored",
            Self::Test | Self::Quiz => "completed",
        }
    }
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub category: String,
    pub verb: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub kind: AssessmentKind,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

impl ScoreRow {
    pub fn undefined(kind: AssessmentKind) -> Self {
        Self {
            kind,
            min: None,
            avg: None,
            max: None,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.min.is_some() || self.avg.is_some() || self.max.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTable {
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn get(&self, kind: AssessmentKind) -> Option<&ScoreRow> {
        self.rows.iter().find(|row| row.kind == kind)
    }

    /// Rows worth charting: undefined statistics count as zero and all-zero rows are skipped.
    pub fn reported(&self) -> impl Iterator<Item = &ScoreRow> {
        self.rows.iter().filter(|row| {
            [row.min, row.avg, row.max]
                .iter()
                .any(|value| value.unwrap_or(0.0) != 0.0)
        })
    }
}

/// Successful-assessment counts for quiz, homework and test, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuccessfulCounts {
    pub quiz: usize,
    pub homework: usize,
    pub test: usize,
}

impl SuccessfulCounts {
    pub fn as_array(&self) -> [usize; 3] {
        [self.quiz, self.homework, self.test]
    }
}

/// Dense place of an actor among a population, ties collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Place {
    pub place: usize,
    pub population_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorResume {
    pub actor_id: ActorId,
    pub course: String,
    pub institution: String,
    pub actions: Vec<ActionCount>,
    pub scores: ScoreTable,
    pub successful: SuccessfulCounts,
    pub place_in_course: Place,
    pub place_in_institution: Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Course,
    Institution,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::Course => f.write_str("course"),
            GroupKind::Institution => f.write_str("institution"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseHeadcount {
    pub course: String,
    pub students: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResume {
    pub name: String,
    pub kind: GroupKind,
    pub actions: Vec<ActionCount>,
    pub scores: ScoreTable,
    pub successful: SuccessfulCounts,
    pub total_students: usize,
    /// Present only for institutions.
    pub students_per_course: Option<Vec<CourseHeadcount>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "lowercase")]
pub enum Resume {
    Actor(ActorResume),
    Group(GroupResume),
}

/// What a resume is requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Actor(ActorId),
    Group(String),
}

impl FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Ok(match trimmed.parse::<ActorId>() {
            Ok(actor_id) => Selector::Actor(actor_id),
            Err(_) => Selector::Group(trimmed.to_string()),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Actor(actor_id) => write!(f, "actor {actor_id}"),
            Selector::Group(name) => write!(f, "group {name}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use super::{ActorId, Event};

    pub fn event(actor_id: ActorId, category: &str, verb: &str) -> Event {
        Event {
            actor_id,
            verb: verb.to_string(),
            object_category: category.to_string(),
            score_scaled: None,
            success: None,
            timestamp: Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap(),
            course: "Algebra".to_string(),
            institution: "North".to_string(),
        }
    }

    pub fn graded(
        actor_id: ActorId,
        category: &str,
        verb: &str,
        score: Option<f64>,
        success: bool,
    ) -> Event {
        Event {
            score_scaled: score,
            success: Some(success),
            ..event(actor_id, category, verb)
        }
    }

    pub fn enrolled(mut event: Event, course: &str, institution: &str) -> Event {
        event.course = course.to_string();
        event.institution = institution.to_string();
        event
    }
}

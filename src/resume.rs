use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::aggregate::{aggregate_actions, aggregate_scores, successful_counts, SuccessCounting, Vocabulary};
use crate::config::DEFAULT_PARALLEL_THRESHOLD;
use crate::error::{EngagementError, Result};
use crate::models::{
    ActorId, ActorResume, CourseHeadcount, Event, GroupKind, GroupResume, Place, Resume, Selector,
};
use crate::normalize::normalize;
use crate::rank::{Fingerprint, Population, Scope, ScoreCache};
use crate::score::ScoreBoard;

/// Successful-assessment counting used in resumes.
pub const RESUME_SUCCESS_COUNTING: SuccessCounting = SuccessCounting::MatchedRows;

/// Decides whether a group name is an institution or a course.
///
/// Institutions win when a name is both.
pub fn resolve_group_kind(events: &[Event], name: &str) -> GroupKind {
    if events.iter().any(|event| event.institution == name) {
        GroupKind::Institution
    } else {
        GroupKind::Course
    }
}

/// A normalized view of one log, built once per report request.
#[derive(Debug)]
pub struct PreparedLog {
    events: Vec<Event>,
    vocabulary: Vocabulary,
    fingerprint: Fingerprint,
}

impl PreparedLog {
    pub fn new(raw: &[Event]) -> Self {
        let events = normalize(raw);
        let vocabulary = Vocabulary::from_events(&events);
        let fingerprint = Fingerprint::of(&events);
        Self {
            events,
            vocabulary,
            fingerprint,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn filtered(&self, keep: impl Fn(&Event) -> bool) -> Vec<Event> {
        self.events.iter().filter(|event| keep(event)).cloned().collect()
    }
}

/// Builds actor and group resumes, reusing population scores across requests on the same log.
#[derive(Debug)]
pub struct ResumeBuilder {
    cache: ScoreCache,
    parallel_threshold: usize,
}

impl Default for ResumeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl ResumeBuilder {
    pub fn new(parallel_threshold: usize) -> Self {
        Self {
            cache: ScoreCache::new(),
            parallel_threshold,
        }
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    pub fn resume(&self, raw: &[Event], selector: &Selector) -> Result<Resume> {
        debug!(%selector, events = raw.len(), "building resume");
        match selector {
            Selector::Actor(actor_id) => self.resume_actor(raw, *actor_id).map(Resume::Actor),
            Selector::Group(name) => Ok(Resume::Group(self.resume_group(raw, name))),
        }
    }

    pub fn resume_actor(&self, raw: &[Event], actor_id: ActorId) -> Result<ActorResume> {
        // enrolment comes from the raw log so actors with only noise rows still resolve
        let enrolment = raw
            .iter()
            .find(|event| event.actor_id == actor_id)
            .ok_or(EngagementError::UnknownActor { actor_id })?;
        let course = enrolment.course.clone();
        let institution = enrolment.institution.clone();

        let log = PreparedLog::new(raw);
        let actor_rows = log.filtered(|event| event.actor_id == actor_id);

        let place_in_course = self.place(&log, actor_id, &Scope::course(course.as_str()));
        let place_in_institution =
            self.place(&log, actor_id, &Scope::institution(institution.as_str()));

        info!(
            actor_id,
            %course,
            course_place = place_in_course.place,
            %institution,
            institution_place = place_in_institution.place,
            "actor resume ready"
        );

        Ok(ActorResume {
            actor_id,
            course,
            institution,
            actions: aggregate_actions(&actor_rows, log.vocabulary()),
            scores: aggregate_scores(&actor_rows),
            successful: successful_counts(&actor_rows, RESUME_SUCCESS_COUNTING),
            place_in_course,
            place_in_institution,
        })
    }

    pub fn resume_group(&self, raw: &[Event], name: &str) -> GroupResume {
        let kind = resolve_group_kind(raw, name);
        debug!(name, %kind, "resolved group name");

        let log = PreparedLog::new(raw);
        let scope = Scope {
            kind,
            name: name.to_string(),
        };
        let group_rows = log.filtered(|event| scope.contains(event));

        let total_students = group_rows
            .iter()
            .map(|event| event.actor_id)
            .collect::<HashSet<_>>()
            .len();

        let students_per_course = match kind {
            GroupKind::Institution => Some(headcount_by_course(&group_rows)),
            GroupKind::Course => None,
        };

        info!(name, %kind, total_students, "group resume ready");

        GroupResume {
            name: name.to_string(),
            kind,
            actions: aggregate_actions(&group_rows, log.vocabulary()),
            scores: aggregate_scores(&group_rows),
            successful: successful_counts(&group_rows, RESUME_SUCCESS_COUNTING),
            total_students,
            students_per_course,
        }
    }

    /// Ranks one actor in a course or institution of the given raw log.
    pub fn rank_actor(&self, raw: &[Event], actor_id: ActorId, scope: &Scope) -> Place {
        let log = PreparedLog::new(raw);
        self.place(&log, actor_id, scope)
    }

    fn place(&self, log: &PreparedLog, actor_id: ActorId, scope: &Scope) -> Place {
        let population = self.population(log, scope);
        let place = population.place_of(actor_id, scope);
        debug!(
            actor_id,
            scope = %scope.kind,
            name = %scope.name,
            place = place.place,
            population = place.population_size,
            "ranked actor"
        );
        place
    }

    fn population(&self, log: &PreparedLog, scope: &Scope) -> Arc<Population> {
        let fingerprint = log.fingerprint();
        self.cache.population(fingerprint, scope, || {
            let board = self.cache.board(fingerprint, || {
                ScoreBoard::build(log.events(), self.parallel_threshold)
            });
            Population::collect(log.events(), scope, &board)
        })
    }
}

fn headcount_by_course(rows: &[Event]) -> Vec<CourseHeadcount> {
    let mut actors: BTreeMap<&str, HashSet<ActorId>> = BTreeMap::new();
    for event in rows {
        actors
            .entry(event.course.as_str())
            .or_default()
            .insert(event.actor_id);
    }

    actors
        .into_iter()
        .map(|(course, members)| CourseHeadcount {
            course: course.to_string(),
            students: members.len(),
        })
        .collect()
}

/// Resume for one actor on a fresh builder.
pub fn resume_actor(raw: &[Event], actor_id: ActorId) -> Result<ActorResume> {
    ResumeBuilder::default().resume_actor(raw, actor_id)
}

/// Resume for a course or institution on a fresh builder.
pub fn resume_group(raw: &[Event], name: &str) -> GroupResume {
    ResumeBuilder::default().resume_group(raw, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{enrolled, event, graded};
    use crate::models::AssessmentKind;

    fn campus() -> Vec<Event> {
        vec![
            enrolled(graded(1, "quiz", "completed", Some(0.9), true), "Algebra", "North"),
            enrolled(event(1, "assessment", "submit"), "Algebra", "North"),
            enrolled(event(1, "page", "viewed"), "Algebra", "North"),
            enrolled(graded(2, "assessment", "completed", Some(0.9), true), "Algebra", "North"),
            enrolled(graded(3, "homework", "scored", Some(0.5), true), "Algebra", "North"),
            enrolled(graded(3, "homework", "scored", Some(0.1), false), "Algebra", "North"),
            enrolled(graded(4, "quiz", "completed", Some(0.95), true), "Biology", "North"),
            enrolled(event(5, "resource", "viewed"), "Chemistry", "South"),
        ]
    }

    #[test]
    fn actor_resume_ranks_within_course_and_institution() {
        let resume = resume_actor(&campus(), 3).expect("actor 3 exists");

        assert_eq!(resume.course, "Algebra");
        assert_eq!(
            resume.place_in_course,
            Place {
                place: 2,
                population_size: 3
            }
        );
        assert_eq!(
            resume.place_in_institution,
            Place {
                place: 3,
                population_size: 4
            }
        );
        assert_eq!(resume.successful.as_array(), [0, 2, 0]);

        let homework = resume.scores.get(AssessmentKind::Homework).unwrap();
        assert_eq!(homework.min, Some(0.1));
        assert_eq!(homework.max, Some(0.5));
    }

    #[test]
    fn actor_actions_cover_whole_log_vocabulary() {
        let resume = resume_actor(&campus(), 1).expect("actor 1 exists");
        let vocabulary = Vocabulary::from_events(&normalize(&campus()));

        assert_eq!(resume.actions.len(), vocabulary.len());
        assert!(resume
            .actions
            .iter()
            .all(|action| action.category != "page"));
        let homework_submit = resume
            .actions
            .iter()
            .find(|action| action.category == "homework" && action.verb == "submit")
            .unwrap();
        assert_eq!(homework_submit.count, 1);
    }

    #[test]
    fn unknown_actor_is_an_error() {
        let err = resume_actor(&campus(), 99).expect_err("actor 99 is absent");
        assert!(matches!(err, EngagementError::UnknownActor { actor_id: 99 }));
    }

    #[test]
    fn institution_resume_breaks_down_by_course() {
        let resume = resume_group(&campus(), "North");

        assert_eq!(resume.kind, GroupKind::Institution);
        assert_eq!(resume.total_students, 4);
        assert_eq!(
            resume.students_per_course,
            Some(vec![
                CourseHeadcount {
                    course: "Algebra".to_string(),
                    students: 3
                },
                CourseHeadcount {
                    course: "Biology".to_string(),
                    students: 1
                },
            ])
        );
        assert_eq!(resume.successful.as_array(), [2, 2, 1]);
    }

    #[test]
    fn course_resume_has_no_breakdown() {
        let resume = resume_group(&campus(), "Chemistry");
        assert_eq!(resume.kind, GroupKind::Course);
        assert_eq!(resume.total_students, 1);
        assert_eq!(resume.students_per_course, None);
    }

    #[test]
    fn institution_name_shadows_course_name() {
        let mut events = campus();
        events.push(enrolled(event(6, "resource", "viewed"), "North", "East"));

        let resume = resume_group(&events, "North");
        assert_eq!(resume.kind, GroupKind::Institution);
        assert_eq!(resume.total_students, 4);
    }

    #[test]
    fn builder_reuses_cached_populations() {
        let builder = ResumeBuilder::new(0);
        let events = campus();

        let first = builder.resume_actor(&events, 1).unwrap();
        let second = builder.resume_actor(&events, 2).unwrap();

        assert_eq!(builder.cache().cached_scopes(), 2);
        assert_eq!(first.place_in_course, second.place_in_course);
        assert_eq!(first.place_in_course.place, 1);
    }

    #[test]
    fn selector_dispatches_to_matching_report() {
        let builder = ResumeBuilder::default();
        let events = campus();

        let actor = builder.resume(&events, &Selector::Actor(4)).unwrap();
        assert!(matches!(actor, Resume::Actor(ref resume) if resume.actor_id == 4));

        let group = builder
            .resume(&events, &Selector::Group("Algebra".to_string()))
            .unwrap();
        assert!(matches!(group, Resume::Group(ref resume) if resume.kind == GroupKind::Course));
    }
}

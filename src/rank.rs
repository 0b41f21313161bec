use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::models::{ActorId, Event, GroupKind, Place};
use crate::score::ScoreBoard;

/// Dense place of `actor_score` among the distinct values of `population`, highest first.
///
/// Equal scores share a place. A score that is not in the population lands where it
/// would sort, so an absent actor is still ranked instead of rejected.
pub fn rank(population: &[f64], actor_score: f64) -> Place {
    let mut distinct: Vec<f64> = population.to_vec();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup();

    let above = distinct.iter().take_while(|value| **value > actor_score).count();

    Place {
        place: above + 1,
        population_size: population.len(),
    }
}

/// Course or institution an actor is ranked within.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scope {
    pub kind: GroupKind,
    pub name: String,
}

impl Scope {
    pub fn course(name: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Course,
            name: name.into(),
        }
    }

    pub fn institution(name: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Institution,
            name: name.into(),
        }
    }

    pub fn contains(&self, event: &Event) -> bool {
        match self.kind {
            GroupKind::Course => event.course == self.name,
            GroupKind::Institution => event.institution == self.name,
        }
    }
}

/// Scores of every distinct actor seen in a scope, ordered by actor id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    members: Vec<(ActorId, f64)>,
}

impl Population {
    pub fn collect(events: &[Event], scope: &Scope, board: &ScoreBoard) -> Self {
        let actors: HashSet<ActorId> = events
            .iter()
            .filter(|event| scope.contains(event))
            .map(|event| event.actor_id)
            .collect();

        let mut members: Vec<(ActorId, f64)> = actors
            .into_iter()
            .map(|actor_id| (actor_id, board.score_or_default(actor_id)))
            .collect();
        members.sort_by_key(|(actor_id, _)| *actor_id);

        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.members.iter().map(|(_, score)| *score).collect()
    }

    pub fn score_of(&self, actor_id: ActorId) -> Option<f64> {
        self.members
            .binary_search_by_key(&actor_id, |(id, _)| *id)
            .ok()
            .map(|index| self.members[index].1)
    }

    pub fn place_of(&self, actor_id: ActorId, scope: &Scope) -> Place {
        let actor_score = match self.score_of(actor_id) {
            Some(score) => score,
            None => {
                warn!(
                    actor_id,
                    scope = %scope.kind,
                    name = %scope.name,
                    "actor outside ranked population, using default score"
                );
                crate::score::MISSING_ACTOR_SCORE
            }
        };
        rank(&self.scores(), actor_score)
    }
}

/// SHA-256 digest of a normalized log's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(events: &[Event]) -> Self {
        let mut hasher = Sha256::new();
        for event in events {
            hasher.update(event.actor_id.to_le_bytes());
            for field in [
                &event.verb,
                &event.object_category,
                &event.course,
                &event.institution,
            ] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
            match event.score_scaled {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update(value.to_bits().to_le_bytes());
                }
                None => hasher.update([0u8]),
            }
            hasher.update([match event.success {
                None => 0u8,
                Some(false) => 1,
                Some(true) => 2,
            }]);
            hasher.update(event.timestamp.timestamp_micros().to_le_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default)]
struct CacheState {
    fingerprint: Option<Fingerprint>,
    board: Option<Arc<ScoreBoard>>,
    populations: HashMap<Scope, Arc<Population>>,
}

impl CacheState {
    fn switch_to(&mut self, fingerprint: &Fingerprint) {
        if self.fingerprint.as_ref() != Some(fingerprint) {
            if let Some(previous) = &self.fingerprint {
                debug!(previous = previous.as_str(), "event log changed, dropping cached scores");
            }
            self.fingerprint = Some(fingerprint.clone());
            self.board = None;
            self.populations.clear();
        }
    }
}

/// Score boards and per-scope populations for the most recent log fingerprint.
#[derive(Debug, Default)]
pub struct ScoreCache {
    state: RwLock<CacheState>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board<F>(&self, fingerprint: &Fingerprint, build: F) -> Arc<ScoreBoard>
    where
        F: FnOnce() -> ScoreBoard,
    {
        {
            let state = self.state.read();
            if state.fingerprint.as_ref() == Some(fingerprint) {
                if let Some(board) = &state.board {
                    debug!(fingerprint = fingerprint.as_str(), "score board cache hit");
                    return Arc::clone(board);
                }
            }
        }

        let board = Arc::new(build());
        let mut state = self.state.write();
        state.switch_to(fingerprint);
        Arc::clone(state.board.get_or_insert(board))
    }

    pub fn population<F>(&self, fingerprint: &Fingerprint, scope: &Scope, build: F) -> Arc<Population>
    where
        F: FnOnce() -> Population,
    {
        {
            let state = self.state.read();
            if state.fingerprint.as_ref() == Some(fingerprint) {
                if let Some(population) = state.populations.get(scope) {
                    debug!(scope = %scope.kind, name = %scope.name, "population cache hit");
                    return Arc::clone(population);
                }
            }
        }

        let population = Arc::new(build());
        let mut state = self.state.write();
        state.switch_to(fingerprint);
        Arc::clone(
            state
                .populations
                .entry(scope.clone())
                .or_insert(population),
        )
    }

    pub fn cached_scopes(&self) -> usize {
        self.state.read().populations.len()
    }
}

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ActorId;

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("actor {actor_id} does not appear in the event log")]
    UnknownActor { actor_id: ActorId },
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed event row: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognised timestamp '{value}'")]
    Timestamp { row: u64, value: String },
}

pub type Result<T, E = EngagementError> = std::result::Result<T, E>;

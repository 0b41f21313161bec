use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_EVENTS_PATH: &str = "data/processed.csv";
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// Runtime settings for the engagement CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: String,
    pub events_path: PathBuf,
    /// Populations at least this large are scored on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            events_path: PathBuf::from(DEFAULT_EVENTS_PATH),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let log_level = env::var("ENGAGEMENT_LOG_LEVEL").unwrap_or(defaults.log_level);
        let events_path = env::var("ENGAGEMENT_EVENTS")
            .map(PathBuf::from)
            .unwrap_or(defaults.events_path);
        let parallel_threshold = match env::var("ENGAGEMENT_PARALLEL_THRESHOLD") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidThreshold { value })?,
            Err(_) => defaults.parallel_threshold,
        };

        Ok(Self {
            log_level,
            events_path,
            parallel_threshold,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ENGAGEMENT_PARALLEL_THRESHOLD must be an unsigned integer, got '{value}'")]
    InvalidThreshold { value: String },
}

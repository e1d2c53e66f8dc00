//! Shared types and configuration for the mentions workspace.

mod app_config;
mod config;
mod mention;
mod tracking;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use mention::{
    FetchConfig, Mention, Platform, PlatformCount, SourceId, Stats, TopicCount, UNKNOWN_TOPIC,
};
pub use tracking::{load_tracking, DomainPolicy, TrackingConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read tracking file {path}: {source}")]
    TrackingFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tracking file: {0}")]
    TrackingFileParse(#[from] serde_yaml::Error),

    #[error("tracking config validation failed: {0}")]
    Validation(String),
}

//! Error types for logtap-core.

use thiserror::Error;

/// Startup configuration failures. None of these are retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint: '{0}' is invalid")]
    InvalidEndpoint(String),

    #[error("topic: '{0}' is not a valid NSQ topic name")]
    InvalidTopic(String),

    #[error("failed to load configuration: {0}")]
    Source(#[from] config::ConfigError),
}

/// A raw line could not be turned into a publishable envelope.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("problem serializing envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

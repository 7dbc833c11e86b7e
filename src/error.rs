//! Error types for migration job generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by external collaborators (stores, sessions, networks).
///
/// Messages are carried verbatim so callers can match on the original text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Query(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage I/O error: {0}")]
    Io(String),
}

/// Errors captured into a job's status while it runs.
///
/// These never cross the `run` boundary; callers read them back through
/// `Job::error`.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobError {
    #[error("dependency network unavailable: {message}")]
    DependencyNetworkUnavailable { message: String },

    #[error("session acquisition failed: {message}")]
    SessionAcquisitionFailed { message: String },

    #[error("query iteration failed for {namespace}: {message}")]
    QueryIterationFailed { namespace: String, message: String },

    #[error("invalid namespace '{namespace}': {message}")]
    InvalidNamespace { namespace: String, message: String },

    #[error("malformed record at position {position}: {message}")]
    MalformedRecord { position: usize, message: String },

    #[error("generation cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("no environment configured for job '{job_id}'")]
    EnvironmentMissing { job_id: String },

    #[error("failed to register dependency group '{owner}': {message}")]
    RegistrationFailed { owner: String, message: String },

    #[error("{count} errors: {messages}")]
    Aggregate { count: usize, messages: String },
}

/// API-level errors: configuration, logging setup, and job type lookup.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    #[error("Job type already registered: {0}")]
    DuplicateJobType(String),

    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

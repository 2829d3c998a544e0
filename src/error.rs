//! Error types for the duplicate-detection engine.
//!
//! Recovery policy:
//! - `SearchUnavailable` is absorbed by the search coordinator (the failing
//!   strategy contributes nothing).
//! - `ContextUnavailable` is absorbed by the analyzer (scoring proceeds with
//!   zero context boost).
//! - `Validation` is always surfaced to the caller.
//! - `AnalysisFailed` is surfaced per task in bulk mode and is terminal for a
//!   single analysis.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A search strategy could not reach its backend.
    #[error("search strategy '{strategy}' unavailable: {reason}")]
    SearchUnavailable { strategy: String, reason: String },

    /// Project context could not be fetched.
    #[error("project context unavailable for '{project_key}': {reason}")]
    ContextUnavailable { project_key: String, reason: String },

    /// Input failed boundary validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A single task analysis could not be completed.
    #[error("analysis failed for task '{task_id}': {reason}")]
    AnalysisFailed { task_id: String, reason: String },

    /// Configuration load or validation failure.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Provider or sink plumbing failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// True for errors the pipeline recovers from internally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::SearchUnavailable { .. } | EngineError::ContextUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

//! Analysis pipelines and their result models.

pub mod aggregator;
pub mod bulk;
pub mod models;
pub mod relationships;
pub mod resolution;

pub use aggregator::DuplicateAnalyzer;
pub use bulk::{BulkAnalysisReport, BulkDuplicateAnalyzer, CrossReference, TaskFailure};
pub use models::{AnalysisStats, DuplicateAnalysis, SimilarIssue};
pub use relationships::EpicSuggestion;
pub use resolution::{
    ConflictResolution, ConflictResolutionManager, ResolutionAction, UserResolution,
};

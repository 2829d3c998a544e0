//! Duplicate detection and similarity analysis for tracker-bound tasks
//!
//! Tasks extracted from meeting transcripts arrive here before anything is
//! created in the issue tracker. The engine searches a project for candidate
//! issues over several concurrent strategies, scores each candidate with a
//! weighted multi-factor similarity measure, classifies the matches and
//! recommends an action: create the task, link it, or treat it as a
//! duplicate. Batches are additionally cross-referenced against themselves so
//! one meeting cannot mint the same work item twice.
//!
//! Integration happens through three traits: [`provider::IssueSearchProvider`]
//! for candidate retrieval, [`provider::ProjectContextProvider`] for sprint,
//! epic and component context, and [`provider::ResultSink`] for persisting
//! analyses and user resolutions.

pub mod analysis;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod search;
pub mod similarity;

pub use analysis::{
    BulkAnalysisReport, BulkDuplicateAnalyzer, ConflictResolutionManager, DuplicateAnalysis,
    DuplicateAnalyzer, EpicSuggestion, SimilarIssue, UserResolution,
};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use model::{CandidateIssue, NewTaskInput, ProjectContext};
pub use provider::{IssueSearchProvider, ProjectContextProvider, ResultSink};
pub use similarity::{MatchType, RecommendedAction, SimilarityScorer, SimilarityScores};

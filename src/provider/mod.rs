//! External collaborator traits. The engine receives implementations through
//! constructor parameters; it owns no transport of its own.

pub mod cache;

use crate::analysis::models::DuplicateAnalysis;
use crate::analysis::resolution::ConflictResolution;
use crate::error::Result;
use crate::model::{CandidateIssue, ProjectContext};
use async_trait::async_trait;
use tokio::sync::Mutex;

pub use cache::CachedContextProvider;

/// Issue retrieval backend (tracker search API, index, ...).
#[async_trait]
pub trait IssueSearchProvider: Send + Sync {
    /// Search issues of a project matching any of the query terms.
    async fn search(
        &self,
        project_key: &str,
        query_terms: &[String],
        max_results: usize,
        include_resolved: bool,
    ) -> Result<Vec<CandidateIssue>>;

    /// Optional semantic retrieval hook. The default implementation returns
    /// nothing, which keeps the semantic strategy a no-op until a backend is
    /// wired in.
    async fn search_semantic(
        &self,
        _project_key: &str,
        _text: &str,
        _max_results: usize,
    ) -> Result<Vec<CandidateIssue>> {
        Ok(Vec::new())
    }
}

/// Source of project metadata (sprints, epics, components, issue types).
#[async_trait]
pub trait ProjectContextProvider: Send + Sync {
    async fn get_context(&self, project_key: &str) -> Result<ProjectContext>;
}

/// Append-only persistence for analyses and resolutions. The engine never
/// reads records back; writes should be idempotent.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record_analysis(&self, analysis: &DuplicateAnalysis) -> Result<()>;
    async fn record_resolution(&self, resolution: &ConflictResolution) -> Result<()>;
}

/// Sink that drops everything. Default when the host keeps results itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl ResultSink for NullSink {
    async fn record_analysis(&self, _analysis: &DuplicateAnalysis) -> Result<()> {
        Ok(())
    }

    async fn record_resolution(&self, _resolution: &ConflictResolution) -> Result<()> {
        Ok(())
    }
}

/// In-memory sink for tests and small deployments.
#[derive(Debug, Default)]
pub struct MemorySink {
    analyses: Mutex<Vec<DuplicateAnalysis>>,
    resolutions: Mutex<Vec<ConflictResolution>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn analyses(&self) -> Vec<DuplicateAnalysis> {
        self.analyses.lock().await.clone()
    }

    pub async fn resolutions(&self) -> Vec<ConflictResolution> {
        self.resolutions.lock().await.clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record_analysis(&self, analysis: &DuplicateAnalysis) -> Result<()> {
        self.analyses.lock().await.push(analysis.clone());
        Ok(())
    }

    async fn record_resolution(&self, resolution: &ConflictResolution) -> Result<()> {
        self.resolutions.lock().await.push(resolution.clone());
        Ok(())
    }
}

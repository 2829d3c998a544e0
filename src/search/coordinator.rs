//! Multi-strategy candidate search.
//!
//! Three strategies run concurrently against the provider:
//! 1. text: the task summary as one phrase query
//! 2. keyword: extracted significant terms
//! 3. semantic: the provider's optional semantic hook
//!
//! Results merge with first-seen-wins dedup by issue key in strategy order.
//! A failed, timed-out or panicked strategy contributes nothing; all three
//! failing yields an empty candidate set, never an error.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::metrics::ENGINE_METRICS;
use crate::model::{CandidateIssue, NewTaskInput};
use crate::provider::IssueSearchProvider;
use crate::similarity::tokens;
use indexmap::IndexMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Deduplicated candidates plus the canonical keyword query, kept for audit.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub issues: Vec<CandidateIssue>,
    pub query: String,
}

pub struct SearchCoordinator {
    provider: Arc<dyn IssueSearchProvider>,
    config: SearchConfig,
}

impl SearchCoordinator {
    pub fn new(provider: Arc<dyn IssueSearchProvider>, config: SearchConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run all strategies within `deadline` and merge their results.
    pub async fn gather_candidates(
        &self,
        task: &NewTaskInput,
        project_key: &str,
        deadline: Duration,
    ) -> CandidateSet {
        let keywords = tokens::extract_keywords(&task.full_text(), self.config.max_keyword_terms);
        let query = keywords.join(" ");
        let max_results = self.config.max_results;
        let include_resolved = self.config.include_resolved;

        let text_handle = {
            let provider = self.provider.clone();
            let project = project_key.to_string();
            let phrase = vec![task.summary.trim().to_string()];
            spawn_strategy("text", deadline, async move {
                provider
                    .search(&project, &phrase, max_results, include_resolved)
                    .await
            })
        };

        let keyword_handle = if keywords.is_empty() {
            None
        } else {
            let provider = self.provider.clone();
            let project = project_key.to_string();
            let terms = keywords.clone();
            Some(spawn_strategy("keyword", deadline, async move {
                provider
                    .search(&project, &terms, max_results, include_resolved)
                    .await
            }))
        };

        let semantic_handle = {
            let provider = self.provider.clone();
            let project = project_key.to_string();
            let text = task.full_text();
            spawn_strategy("semantic", deadline, async move {
                provider.search_semantic(&project, &text, max_results).await
            })
        };

        let text_results = join_strategy("text", text_handle).await;
        let keyword_results = match keyword_handle {
            Some(handle) => join_strategy("keyword", handle).await,
            None => Vec::new(),
        };
        let semantic_results = join_strategy("semantic", semantic_handle).await;

        let mut merged: IndexMap<String, CandidateIssue> = IndexMap::new();
        let mut raw_total = 0;
        for batch in [text_results, keyword_results, semantic_results] {
            raw_total += batch.len();
            for issue in batch {
                merged.entry(issue.key.clone()).or_insert(issue);
            }
        }

        debug!(
            project_key,
            raw = raw_total,
            unique = merged.len(),
            query = %query,
            "candidate search merged"
        );

        CandidateSet {
            issues: merged.into_values().collect(),
            query,
        }
    }
}

/// Run one strategy on its own task so a panic cannot take down the others.
fn spawn_strategy<F>(
    strategy: &'static str,
    deadline: Duration,
    search: F,
) -> JoinHandle<Vec<CandidateIssue>>
where
    F: Future<Output = Result<Vec<CandidateIssue>>> + Send + 'static,
{
    tokio::spawn(async move {
        let started = Instant::now();
        match tokio::time::timeout(deadline, search).await {
            Ok(Ok(issues)) => {
                ENGINE_METRICS.record_search_strategy(
                    strategy,
                    "success",
                    started.elapsed().as_secs_f64(),
                );
                debug!(strategy, found = issues.len(), "search strategy finished");
                issues
            }
            Ok(Err(err)) => {
                ENGINE_METRICS.record_search_strategy(
                    strategy,
                    "error",
                    started.elapsed().as_secs_f64(),
                );
                warn!(strategy, error = %err, "search strategy failed, continuing without it");
                Vec::new()
            }
            Err(_) => {
                ENGINE_METRICS.record_search_strategy(
                    strategy,
                    "timeout",
                    started.elapsed().as_secs_f64(),
                );
                warn!(strategy, ?deadline, "search strategy timed out, abandoning it");
                Vec::new()
            }
        }
    })
}

async fn join_strategy(
    strategy: &'static str,
    handle: JoinHandle<Vec<CandidateIssue>>,
) -> Vec<CandidateIssue> {
    match handle.await {
        Ok(issues) => issues,
        Err(err) => {
            warn!(strategy, error = %err, "search strategy task aborted");
            Vec::new()
        }
    }
}

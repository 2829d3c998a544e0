//! Single-task duplicate analysis pipeline: fetch context, gather
//! candidates, score, apply the inclusion floor and build the result.
//!
//! Degradation policy: a missing project context means zero context boost,
//! a failed search means fewer candidates. Finding no duplicates is a
//! success, never an error.

use crate::analysis::models::{DuplicateAnalysis, SimilarIssue};
use crate::analysis::relationships::{suggest_epics, EpicSuggestion};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics::ENGINE_METRICS;
use crate::model::{NewTaskInput, ProjectContext};
use crate::provider::{IssueSearchProvider, ProjectContextProvider, ResultSink};
use crate::search::SearchCoordinator;
use crate::similarity::{ContextFactorAnalyzer, SimilarityScorer};
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct DuplicateAnalyzer {
    coordinator: SearchCoordinator,
    context_provider: Arc<dyn ProjectContextProvider>,
    sink: Arc<dyn ResultSink>,
    factor_analyzer: ContextFactorAnalyzer,
    scorer: SimilarityScorer,
    config: EngineConfig,
}

impl DuplicateAnalyzer {
    pub fn new(
        config: EngineConfig,
        search_provider: Arc<dyn IssueSearchProvider>,
        context_provider: Arc<dyn ProjectContextProvider>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self> {
        config.validate()?;
        let scorer = SimilarityScorer::new(config.scoring.clone())?;
        let coordinator = SearchCoordinator::new(search_provider, config.search.clone());
        Ok(Self {
            coordinator,
            context_provider,
            sink,
            factor_analyzer: ContextFactorAnalyzer::new(),
            scorer,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Analyze with the default deadline from the search configuration.
    pub async fn analyze_task(
        &self,
        task_id: &str,
        task: &NewTaskInput,
        project_key: &str,
    ) -> Result<DuplicateAnalysis> {
        self.analyze_task_with_deadline(task_id, task, project_key, self.config.search.timeout())
            .await
    }

    /// Analyze under a caller-supplied deadline. On expiry the pipeline
    /// completes with whatever candidates were gathered in time.
    pub async fn analyze_task_with_deadline(
        &self,
        task_id: &str,
        task: &NewTaskInput,
        project_key: &str,
        deadline: Duration,
    ) -> Result<DuplicateAnalysis> {
        task.validate()?;
        let started = Instant::now();

        let context = self.fetch_context(project_key, deadline).await;

        let remaining = deadline.saturating_sub(started.elapsed());
        let candidates = self
            .coordinator
            .gather_candidates(task, project_key, remaining)
            .await;
        let total_searched = candidates.issues.len();
        ENGINE_METRICS.record_candidates(total_searched);

        // One reference instant keeps temporal decay identical across all
        // candidates of this analysis.
        let reference = Utc::now();
        let floor = self.config.analysis.inclusion_floor;
        let mut similar: Vec<SimilarIssue> = candidates
            .issues
            .iter()
            .filter_map(|candidate| {
                let factors = self
                    .factor_analyzer
                    .analyze(task, candidate, &context, reference);
                let scores = self.scorer.score(task, candidate, &factors);
                if scores.overall_score >= floor {
                    Some(SimilarIssue::from_candidate(candidate, scores, factors))
                } else {
                    None
                }
            })
            .collect();

        similar.sort_by(|a, b| {
            b.overall_score()
                .partial_cmp(&a.overall_score())
                .unwrap_or(Ordering::Equal)
        });
        similar.truncate(self.config.search.max_results);

        let analysis = DuplicateAnalysis::new(
            task_id,
            project_key,
            candidates.query,
            similar,
            started.elapsed().as_millis() as u64,
            total_searched,
        );

        ENGINE_METRICS.record_analysis(
            true,
            started.elapsed().as_secs_f64(),
            analysis.actionable_duplicates().len(),
        );
        info!(
            task_id,
            project_key,
            searched = total_searched,
            similar = analysis.similar_issues.len(),
            confidence = analysis.confidence,
            action = %analysis.recommended_action,
            elapsed_ms = analysis.analysis_time_ms,
            "duplicate analysis complete"
        );

        // The sink is append-only audit; losing a write must not fail the
        // analysis itself.
        if let Err(err) = self.sink.record_analysis(&analysis).await {
            warn!(task_id, error = %err, "failed to persist analysis");
        }

        Ok(analysis)
    }

    /// Suggest parent epics for a task from the project context. A missing
    /// context degrades to no suggestions, never an error.
    pub async fn suggest_epic_relationships(
        &self,
        task: &NewTaskInput,
        project_key: &str,
    ) -> Result<Vec<EpicSuggestion>> {
        task.validate()?;
        let context = self
            .fetch_context(project_key, self.config.search.timeout())
            .await;
        let suggestions = suggest_epics(task, &context);
        info!(
            project_key,
            epics = context.epics.len(),
            suggestions = suggestions.len(),
            "epic relationship suggestion complete"
        );
        Ok(suggestions)
    }

    async fn fetch_context(&self, project_key: &str, deadline: Duration) -> ProjectContext {
        match tokio::time::timeout(deadline, self.context_provider.get_context(project_key)).await
        {
            Ok(Ok(context)) => context,
            Ok(Err(err)) => {
                warn!(
                    project_key,
                    error = %err,
                    "project context unavailable, scoring without context boost"
                );
                ProjectContext::empty(project_key)
            }
            Err(_) => {
                warn!(
                    project_key,
                    "project context fetch timed out, scoring without context boost"
                );
                ProjectContext::empty(project_key)
            }
        }
    }
}

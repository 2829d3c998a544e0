//! Batch analysis: several proposed tasks against one project, plus
//! task-to-task cross-referencing inside the batch.
//!
//! One failing task never sinks the batch; it is reported in
//! [`BulkAnalysisReport::failures`] while the rest complete.

use crate::analysis::aggregator::DuplicateAnalyzer;
use crate::analysis::models::DuplicateAnalysis;
use crate::error::{EngineError, Result};
use crate::metrics::ENGINE_METRICS;
use crate::model::NewTaskInput;
use crate::similarity::{MatchType, RecommendedAction, SimilarityScores};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Confidence above which a best match counts as high confidence.
const HIGH_CONFIDENCE: f64 = 0.8;

/// Two tasks of the same batch that describe overlapping work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    pub task_a: String,
    pub task_b: String,
    pub scores: SimilarityScores,
    pub match_type: MatchType,
    pub recommendation: RecommendedAction,
}

/// A task whose analysis failed; the rest of the batch is unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub task_id: String,
    pub error: String,
}

/// Aggregate counters over a finished batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_similar_issues: usize,
    /// Tasks with at least one match at or above the similar threshold.
    pub tasks_with_duplicates: usize,
    pub cross_references_found: usize,
    /// Analyses whose best-match confidence exceeds 0.8.
    pub high_confidence_matches: usize,
    /// Recommended-action histogram in first-occurrence order.
    pub recommendations: IndexMap<RecommendedAction, usize>,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkAnalysisReport {
    pub project_key: String,
    pub total_tasks: usize,
    pub analyses: Vec<DuplicateAnalysis>,
    pub cross_references: Vec<CrossReference>,
    pub failures: Vec<TaskFailure>,
    pub summary: BatchSummary,
    pub analyzed_at: DateTime<Utc>,
}

/// Runs per-task analyses concurrently and cross-references the batch.
pub struct BulkDuplicateAnalyzer {
    analyzer: Arc<DuplicateAnalyzer>,
}

impl BulkDuplicateAnalyzer {
    pub fn new(analyzer: Arc<DuplicateAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Analyze a batch of proposed tasks. Task ids are positional
    /// (`task_0`, `task_1`, ...) and stable across the report. Each task
    /// runs with the default deadline from the search configuration.
    pub async fn analyze_batch(
        &self,
        tasks: &[NewTaskInput],
        project_key: &str,
    ) -> Result<BulkAnalysisReport> {
        self.run_batch(tasks, project_key, None).await
    }

    /// Analyze a batch under one overall deadline. Every task runs with
    /// whatever budget remains when it acquires a slot; an exhausted budget
    /// degrades that task to an empty search instead of failing it.
    pub async fn analyze_batch_with_deadline(
        &self,
        tasks: &[NewTaskInput],
        project_key: &str,
        deadline: Duration,
    ) -> Result<BulkAnalysisReport> {
        self.run_batch(tasks, project_key, Some(Instant::now() + deadline))
            .await
    }

    async fn run_batch(
        &self,
        tasks: &[NewTaskInput],
        project_key: &str,
        batch_deadline: Option<Instant>,
    ) -> Result<BulkAnalysisReport> {
        let analysis_config = &self.analyzer.config().analysis;
        if tasks.len() > analysis_config.max_batch_size {
            return Err(EngineError::Validation(format!(
                "batch of {} tasks exceeds the maximum of {}",
                tasks.len(),
                analysis_config.max_batch_size
            )));
        }

        info!(
            project_key,
            tasks = tasks.len(),
            concurrency = analysis_config.max_concurrent_analyses,
            "starting bulk duplicate analysis"
        );

        let semaphore = Arc::new(Semaphore::new(analysis_config.max_concurrent_analyses));
        let outcomes = join_all(tasks.iter().enumerate().map(|(index, task)| {
            let task_id = format!("task_{index}");
            let analyzer = Arc::clone(&self.analyzer);
            let semaphore = Arc::clone(&semaphore);
            let project = project_key.to_string();
            let task = task.clone();
            async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            task_id,
                            Err(EngineError::Internal("analysis semaphore closed".to_string())),
                        )
                    }
                };
                let result = match batch_deadline {
                    Some(deadline) => {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        analyzer
                            .analyze_task_with_deadline(&task_id, &task, &project, remaining)
                            .await
                    }
                    None => analyzer.analyze_task(&task_id, &task, &project).await,
                };
                (task_id, result)
            }
        }))
        .await;

        let mut analyses = Vec::with_capacity(tasks.len());
        let mut failures = Vec::new();
        for (task_id, outcome) in outcomes {
            match outcome {
                Ok(analysis) => analyses.push(analysis),
                Err(err) => {
                    warn!(task_id, error = %err, "task analysis failed, continuing batch");
                    ENGINE_METRICS.record_analysis_failure();
                    failures.push(TaskFailure {
                        task_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        let cross_references =
            self.cross_reference(tasks, analysis_config.cross_reference_threshold);
        let summary = summarize(&analyses, &cross_references);

        ENGINE_METRICS.record_batch(cross_references.len());
        info!(
            project_key,
            completed = analyses.len(),
            failed = failures.len(),
            cross_references = cross_references.len(),
            tasks_with_duplicates = summary.tasks_with_duplicates,
            "bulk duplicate analysis complete"
        );

        Ok(BulkAnalysisReport {
            project_key: project_key.to_string(),
            total_tasks: tasks.len(),
            analyses,
            cross_references,
            failures,
            summary,
            analyzed_at: Utc::now(),
        })
    }

    /// Score every unordered task pair once (`i < j`) and keep the pairs at
    /// or above the threshold.
    fn cross_reference(&self, tasks: &[NewTaskInput], threshold: f64) -> Vec<CrossReference> {
        let scorer = self.analyzer.scorer();
        let mut references = Vec::new();
        for i in 0..tasks.len() {
            for j in (i + 1)..tasks.len() {
                let scores = scorer.score_task_pair(&tasks[i], &tasks[j]);
                if scores.overall_score < threshold {
                    continue;
                }
                let match_type = MatchType::from_score(scores.overall_score);
                debug!(
                    task_a = i,
                    task_b = j,
                    score = scores.overall_score,
                    match_type = %match_type,
                    "cross-reference within batch"
                );
                references.push(CrossReference {
                    task_a: format!("task_{i}"),
                    task_b: format!("task_{j}"),
                    recommendation: match_type.recommendation(),
                    match_type,
                    scores,
                });
            }
        }
        references
    }
}

fn summarize(
    analyses: &[DuplicateAnalysis],
    cross_references: &[CrossReference],
) -> BatchSummary {
    let mut recommendations: IndexMap<RecommendedAction, usize> = IndexMap::new();
    for analysis in analyses {
        *recommendations.entry(analysis.recommended_action).or_insert(0) += 1;
    }
    BatchSummary {
        total_similar_issues: analyses
            .iter()
            .map(|analysis| analysis.similar_issues.len())
            .sum(),
        tasks_with_duplicates: analyses
            .iter()
            .filter(|analysis| analysis.has_significant_duplicates())
            .count(),
        cross_references_found: cross_references.len(),
        high_confidence_matches: analyses
            .iter()
            .filter(|analysis| analysis.confidence > HIGH_CONFIDENCE)
            .count(),
        recommendations,
    }
}

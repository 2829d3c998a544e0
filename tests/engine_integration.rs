//! End-to-end engine tests over in-memory providers.
//!
//! These cover the full flows: near-duplicate detection for a single task,
//! a clean project, batch analysis with in-batch cross-references, the
//! resolved-issue search flag, parent-epic suggestion and the conflict
//! resolution workflow.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use issue_dedupe::analysis::{BulkDuplicateAnalyzer, ResolutionAction};
use issue_dedupe::model::{EpicInfo, SprintInfo, SprintState};
use issue_dedupe::provider::{CachedContextProvider, MemorySink};
use issue_dedupe::{
    CandidateIssue, ConflictResolutionManager, DuplicateAnalyzer, EngineConfig, EngineError,
    IssueSearchProvider, NewTaskInput, ProjectContext, ProjectContextProvider, RecommendedAction,
    Result, UserResolution,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Tracker stand-in: naive word-match search over summary and description.
struct InMemoryTracker {
    issues: Vec<CandidateIssue>,
}

#[async_trait]
impl IssueSearchProvider for InMemoryTracker {
    async fn search(
        &self,
        _project_key: &str,
        query_terms: &[String],
        max_results: usize,
        include_resolved: bool,
    ) -> Result<Vec<CandidateIssue>> {
        let mut hits = Vec::new();
        for issue in &self.issues {
            if !include_resolved && issue.status.eq_ignore_ascii_case("Done") {
                continue;
            }
            let text = issue.full_text().to_lowercase();
            let matched = query_terms.iter().any(|term| {
                term.to_lowercase()
                    .split_whitespace()
                    .any(|word| text.contains(word))
            });
            if matched {
                hits.push(issue.clone());
            }
            if hits.len() >= max_results {
                break;
            }
        }
        Ok(hits)
    }
}

struct StaticContext {
    context: ProjectContext,
}

#[async_trait]
impl ProjectContextProvider for StaticContext {
    async fn get_context(&self, _project_key: &str) -> Result<ProjectContext> {
        Ok(self.context.clone())
    }
}

struct CountingContext {
    calls: AtomicUsize,
}

#[async_trait]
impl ProjectContextProvider for CountingContext {
    async fn get_context(&self, project_key: &str) -> Result<ProjectContext> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProjectContext::empty(project_key))
    }
}

/// Opt-in log output while debugging tests, via `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn seeded_context() -> ProjectContext {
    let mut context = ProjectContext::new("PROJ", "Payments Platform");
    context.sprints = vec![SprintInfo {
        id: 42,
        name: "Sprint 42".to_string(),
        state: SprintState::Active,
    }];
    context.epics = vec![EpicInfo {
        key: "PROJ-100".to_string(),
        summary: "User Authentication".to_string(),
        status: "Open".to_string(),
    }];
    context.issue_types = vec!["Task".to_string(), "Bug".to_string(), "Story".to_string()];
    context
}

fn near_duplicate_issue() -> CandidateIssue {
    CandidateIssue::new("PROJ-123", "Implement user authentication API")
        .with_description("Create login and registration flow for the public API")
        .with_issue_type("Task")
        .with_status("In Progress")
        .with_epic("PROJ-100")
        .with_sprint(42)
        .with_created(Utc::now() - Duration::days(3))
}

fn loosely_related_issue() -> CandidateIssue {
    CandidateIssue::new("PROJ-456", "Optimize login page load time")
        .with_description("Reduce bundle size and lazy load assets for the login page")
        .with_issue_type("Task")
        .with_created(Utc::now() - Duration::days(10))
}

fn login_task() -> NewTaskInput {
    NewTaskInput::new(
        "Implement user login API",
        "Create login and registration flow for the public API",
        "Task",
    )
    .unwrap()
    .with_epic("PROJ-100")
}

fn engine(issues: Vec<CandidateIssue>, sink: Arc<MemorySink>) -> DuplicateAnalyzer {
    init_tracing();
    DuplicateAnalyzer::new(
        EngineConfig::default(),
        Arc::new(InMemoryTracker { issues }),
        Arc::new(StaticContext {
            context: seeded_context(),
        }),
        sink,
    )
    .unwrap()
}

#[tokio::test]
async fn test_detects_near_duplicate_end_to_end() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(
        vec![near_duplicate_issue(), loosely_related_issue()],
        sink.clone(),
    );

    let analysis = engine
        .analyze_task("task_0", &login_task(), "PROJ")
        .await
        .unwrap();

    // Both issues match the search terms; only the near-duplicate survives
    // the inclusion floor.
    assert_eq!(analysis.total_issues_searched, 2);
    assert_eq!(analysis.similar_issues.len(), 1);

    let best = analysis.best_match().unwrap();
    assert_eq!(best.issue_key, "PROJ-123");
    assert!(best.overall_score() >= 0.70, "got {}", best.overall_score());
    assert!(matches!(
        analysis.recommended_action,
        RecommendedAction::ConsiderLinking | RecommendedAction::ReviewRequired
    ));
    assert!(analysis.reasoning.contains("similarity"));
    assert!(analysis.has_significant_duplicates());

    // Keywords come from the combined text in first-appearance order.
    assert_eq!(
        analysis.search_query,
        "implement user login create registration"
    );
    assert_eq!(sink.analyses().await.len(), 1);
}

#[tokio::test]
async fn test_clean_project_recommends_create_new() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(Vec::new(), sink.clone());

    let analysis = engine
        .analyze_task("task_0", &login_task(), "PROJ")
        .await
        .unwrap();

    assert!(analysis.similar_issues.is_empty());
    assert!(analysis.best_match().is_none());
    assert_eq!(analysis.confidence, 0.0);
    assert_eq!(analysis.recommended_action, RecommendedAction::CreateNew);
    assert_eq!(analysis.reasoning, "No similar issues found in project");
    assert_eq!(sink.analyses().await.len(), 1);
}

#[tokio::test]
async fn test_resolved_issues_excluded_by_default() {
    let resolved_duplicate = near_duplicate_issue().with_status("Done");
    let sink = Arc::new(MemorySink::new());
    let engine = engine(vec![resolved_duplicate.clone()], sink);

    let analysis = engine
        .analyze_task("task_0", &login_task(), "PROJ")
        .await
        .unwrap();
    assert!(
        analysis.similar_issues.is_empty(),
        "resolved issues must not surface by default"
    );

    // Opting in via configuration brings them back.
    let mut config = EngineConfig::default();
    config.search.include_resolved = true;
    let engine = DuplicateAnalyzer::new(
        config,
        Arc::new(InMemoryTracker {
            issues: vec![resolved_duplicate],
        }),
        Arc::new(StaticContext {
            context: seeded_context(),
        }),
        Arc::new(MemorySink::new()),
    )
    .unwrap();
    let analysis = engine
        .analyze_task("task_0", &login_task(), "PROJ")
        .await
        .unwrap();
    assert_eq!(analysis.similar_issues.len(), 1);
}

#[tokio::test]
async fn test_epic_suggested_for_related_task() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(Vec::new(), sink);
    let task = NewTaskInput::new("Improve user authentication", "", "Task").unwrap();

    let suggestions = engine
        .suggest_epic_relationships(&task, "PROJ")
        .await
        .unwrap();

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].epic_key, "PROJ-100");
    assert_eq!(suggestions[0].epic_summary, "User Authentication");
    assert!(suggestions[0].similarity_score > 0.3);
}

#[tokio::test]
async fn test_bulk_batch_cross_references() {
    let sink = Arc::new(MemorySink::new());
    let bulk = BulkDuplicateAnalyzer::new(Arc::new(engine(Vec::new(), sink)));

    let tasks = vec![
        NewTaskInput::new(
            "Add login form",
            "Create the login form for the web UI",
            "Task",
        )
        .unwrap(),
        NewTaskInput::new(
            "Add the login form UI",
            "Create the login form for the web UI",
            "Task",
        )
        .unwrap(),
        NewTaskInput::new(
            "Update database schema for orders",
            "Add indexes to the orders table",
            "Task",
        )
        .unwrap(),
    ];

    let report = bulk.analyze_batch(&tasks, "PROJ").await.unwrap();

    assert_eq!(report.total_tasks, 3);
    assert_eq!(report.analyses.len(), 3);
    assert!(report.failures.is_empty());

    assert_eq!(report.cross_references.len(), 1);
    let reference = &report.cross_references[0];
    assert_eq!((reference.task_a.as_str(), reference.task_b.as_str()), ("task_0", "task_1"));
    assert!(reference.scores.overall_score >= 0.7);

    assert_eq!(report.summary.cross_references_found, 1);
    assert_eq!(report.summary.tasks_with_duplicates, 0);
    assert_eq!(
        report.summary.recommendations.get(&RecommendedAction::CreateNew),
        Some(&3)
    );
}

#[tokio::test]
async fn test_resolution_workflow_end_to_end() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(vec![near_duplicate_issue()], sink.clone());
    let mut analysis = engine
        .analyze_task("task_0", &login_task(), "PROJ")
        .await
        .unwrap();
    assert!(!analysis.is_resolved());

    let manager = ConflictResolutionManager::new(sink.clone());
    let decision = UserResolution::new(
        ResolutionAction::LinkToExisting,
        Some("PROJ-123".to_string()),
        "same endpoint, link instead of creating",
        "alice",
        5,
    )
    .unwrap();

    let records = manager
        .resolve_conflicts(std::slice::from_mut(&mut analysis), vec![decision])
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].target_issue_key.as_deref(), Some("PROJ-123"));
    assert!(analysis.is_resolved());
    assert_eq!(sink.resolutions().await.len(), 1);
    assert!(manager.applied_resolution("task_0").is_some());
}

#[tokio::test]
async fn test_partial_resolution_batch_rejected() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(vec![near_duplicate_issue()], sink.clone());

    let mut analyses = vec![
        engine
            .analyze_task("task_0", &login_task(), "PROJ")
            .await
            .unwrap(),
        engine
            .analyze_task("task_1", &login_task(), "PROJ")
            .await
            .unwrap(),
    ];

    let manager = ConflictResolutionManager::new(sink.clone());
    let one_decision = vec![UserResolution::new(
        ResolutionAction::SkipCreation,
        None,
        "",
        "bob",
        3,
    )
    .unwrap()];

    let err = manager
        .resolve_conflicts(&mut analyses, one_decision)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(analyses.iter().all(|a| !a.is_resolved()));
    assert!(sink.resolutions().await.is_empty());
}

#[tokio::test]
async fn test_context_fetched_once_through_cache() {
    let counting = Arc::new(CountingContext {
        calls: AtomicUsize::new(0),
    });
    let cached = Arc::new(CachedContextProvider::new(
        counting.clone(),
        &EngineConfig::default().context_cache,
    ));
    let engine = DuplicateAnalyzer::new(
        EngineConfig::default(),
        Arc::new(InMemoryTracker { issues: Vec::new() }),
        cached,
        Arc::new(MemorySink::new()),
    )
    .unwrap();

    engine
        .analyze_task("task_0", &login_task(), "PROJ")
        .await
        .unwrap();
    engine
        .analyze_task("task_1", &login_task(), "PROJ")
        .await
        .unwrap();

    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_analysis_serializes_for_host_api() {
    let sink = Arc::new(MemorySink::new());
    let engine = engine(vec![near_duplicate_issue()], sink);
    let analysis = engine
        .analyze_task("task_0", &login_task(), "PROJ")
        .await
        .unwrap();

    let json = serde_json::to_string(&analysis).unwrap();
    let back: issue_dedupe::DuplicateAnalysis = serde_json::from_str(&json).unwrap();
    assert_eq!(back, analysis);
    assert!(json.contains("\"recommended_action\""));
    assert!(json.contains("\"match_type\""));
}

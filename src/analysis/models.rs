//! Analysis result model.
//!
//! Invariants:
//! - `match_type` is always derived from `overall_score` through the one
//!   classifier, never set independently.
//! - `best_match`, `confidence`, `recommended_action` and `reasoning` are
//!   recomputed at construction from the similar-issue list.
//! - A resolution attaches exactly once and is immutable afterwards.

use crate::analysis::resolution::UserResolution;
use crate::error::{EngineError, Result};
use crate::model::CandidateIssue;
use crate::similarity::classifier::SIMILAR_THRESHOLD;
use crate::similarity::{ContextFactors, MatchType, RecommendedAction, SimilarityScores};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An existing issue judged similar to a proposed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarIssue {
    pub issue_key: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub scores: SimilarityScores,
    pub context_factors: ContextFactors,
    pub match_type: MatchType,
}

impl SimilarIssue {
    /// Snapshot a candidate with its scores. The match type is derived from
    /// the overall score here and nowhere else.
    pub fn from_candidate(
        candidate: &CandidateIssue,
        scores: SimilarityScores,
        context_factors: ContextFactors,
    ) -> Self {
        let match_type = MatchType::from_score(scores.overall_score);
        Self {
            issue_key: candidate.key.clone(),
            summary: candidate.summary.clone(),
            description: candidate.description.clone(),
            status: candidate.status.clone(),
            issue_type: candidate.issue_type.clone(),
            priority: candidate.priority.clone(),
            assignee: candidate.assignee.clone(),
            created_date: candidate.created,
            updated_date: candidate.updated,
            url: candidate.url.clone(),
            scores,
            context_factors,
            match_type,
        }
    }

    pub fn overall_score(&self) -> f64 {
        self.scores.overall_score
    }

    /// Strong enough to block blind creation (very similar or identical).
    pub fn is_actionable(&self) -> bool {
        self.match_type.is_actionable()
    }

    pub fn recommendation(&self) -> RecommendedAction {
        self.match_type.recommendation()
    }
}

/// Flat counters over one analysis, for logs and host dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_issues_searched: usize,
    pub similar_issues_found: usize,
    pub actionable_duplicates: usize,
    pub best_match_score: f64,
    pub analysis_time_ms: u64,
    pub has_resolution: bool,
}

/// Outcome of analyzing one proposed task against a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateAnalysis {
    pub analysis_id: Uuid,
    pub task_id: String,
    pub project_key: String,
    /// Canonical keyword query the search ran with, kept for audit.
    #[serde(default)]
    pub search_query: String,
    pub similar_issues: Vec<SimilarIssue>,
    /// Snapshot of the top similar issue; `None` iff the list is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_match: Option<SimilarIssue>,
    /// Overall score of the best match, 0.0 without one.
    pub confidence: f64,
    pub recommended_action: RecommendedAction,
    pub reasoning: String,
    pub analysis_time_ms: u64,
    /// Raw candidate count before the inclusion floor was applied.
    pub total_issues_searched: usize,
    pub analyzed_at: DateTime<Utc>,
    pub algorithm_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<UserResolution>,
}

impl DuplicateAnalysis {
    /// Build an analysis from scored issues. All derived fields (best match,
    /// confidence, action, reasoning) are computed here; callers never set
    /// them independently.
    pub fn new(
        task_id: impl Into<String>,
        project_key: impl Into<String>,
        search_query: impl Into<String>,
        similar_issues: Vec<SimilarIssue>,
        analysis_time_ms: u64,
        total_issues_searched: usize,
    ) -> Self {
        let best_match = best_of(&similar_issues).cloned();
        let confidence = best_match
            .as_ref()
            .map(|issue| issue.overall_score())
            .unwrap_or(0.0);
        let recommended_action = best_match
            .as_ref()
            .map(|issue| issue.recommendation())
            .unwrap_or(RecommendedAction::CreateNew);
        let reasoning = reasoning_for(best_match.as_ref());

        Self {
            analysis_id: Uuid::new_v4(),
            task_id: task_id.into(),
            project_key: project_key.into(),
            search_query: search_query.into(),
            similar_issues,
            best_match,
            confidence,
            recommended_action,
            reasoning,
            analysis_time_ms,
            total_issues_searched,
            analyzed_at: Utc::now(),
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            resolution: None,
        }
    }

    pub fn best_match(&self) -> Option<&SimilarIssue> {
        self.best_match.as_ref()
    }

    /// Any match at or above the similar threshold.
    pub fn has_significant_duplicates(&self) -> bool {
        self.similar_issues
            .iter()
            .any(|issue| issue.overall_score() >= SIMILAR_THRESHOLD)
    }

    pub fn actionable_duplicates(&self) -> Vec<&SimilarIssue> {
        self.similar_issues
            .iter()
            .filter(|issue| issue.is_actionable())
            .collect()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Attach the user's decision. Succeeds exactly once; analyses are
    /// immutable after resolution.
    pub fn attach_resolution(&mut self, resolution: UserResolution) -> Result<()> {
        if self.resolution.is_some() {
            return Err(EngineError::Validation(format!(
                "analysis for task '{}' is already resolved",
                self.task_id
            )));
        }
        self.resolution = Some(resolution);
        Ok(())
    }

    pub fn stats(&self) -> AnalysisStats {
        AnalysisStats {
            total_issues_searched: self.total_issues_searched,
            similar_issues_found: self.similar_issues.len(),
            actionable_duplicates: self.actionable_duplicates().len(),
            best_match_score: self.confidence,
            analysis_time_ms: self.analysis_time_ms,
            has_resolution: self.is_resolved(),
        }
    }
}

/// First issue with the maximum overall score.
fn best_of(issues: &[SimilarIssue]) -> Option<&SimilarIssue> {
    let mut best: Option<&SimilarIssue> = None;
    for issue in issues {
        match best {
            Some(current) if issue.overall_score() <= current.overall_score() => {}
            _ => best = Some(issue),
        }
    }
    best
}

/// Reasoning tiers follow the match type so the thresholds stay in the
/// classifier alone.
fn reasoning_for(best: Option<&SimilarIssue>) -> String {
    let Some(best) = best else {
        return "No similar issues found in project".to_string();
    };
    let percent = best.overall_score() * 100.0;
    let reason = best.scores.primary_match_reason();
    match best.match_type {
        MatchType::Identical => {
            format!("Very high similarity ({percent:.0}%) based on {reason}")
        }
        MatchType::VerySimilar => {
            format!("High similarity ({percent:.0}%) based on {reason} - review recommended")
        }
        MatchType::Similar => {
            format!("Moderate similarity ({percent:.0}%) based on {reason} - consider linking")
        }
        MatchType::Related | MatchType::Weak => {
            format!("Low similarity ({percent:.0}%) - safe to create new issue")
        }
    }
}

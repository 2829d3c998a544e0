//! Conflict resolution workflow.
//!
//! Detected duplicates wait for an explicit user decision; nothing is
//! auto-merged. A batch of decisions is validated all-or-nothing before any
//! of them is applied, then applied per item: a persistence failure is
//! reported at the end but already-applied resolutions stay applied.

use crate::analysis::models::DuplicateAnalysis;
use crate::error::{EngineError, Result};
use crate::metrics::ENGINE_METRICS;
use crate::provider::ResultSink;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// What the user decided to do with a proposed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    CreateNew,
    LinkToExisting,
    MergeWithExisting,
    SkipCreation,
}

impl ResolutionAction {
    /// Link and merge decisions must name the issue they point at.
    pub fn requires_target(&self) -> bool {
        matches!(
            self,
            ResolutionAction::LinkToExisting | ResolutionAction::MergeWithExisting
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionAction::CreateNew => "create_new",
            ResolutionAction::LinkToExisting => "link_to_existing",
            ResolutionAction::MergeWithExisting => "merge_with_existing",
            ResolutionAction::SkipCreation => "skip_creation",
        }
    }
}

impl fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's decision for one detected duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResolution {
    pub action_taken: ResolutionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_issue: Option<String>,
    #[serde(default)]
    pub user_reasoning: String,
    pub resolved_by: String,
    pub resolved_at: DateTime<Utc>,
    /// Self-reported certainty, 1 (unsure) to 5 (certain).
    pub confidence_in_decision: u8,
}

impl UserResolution {
    pub fn new(
        action_taken: ResolutionAction,
        selected_issue: Option<String>,
        user_reasoning: impl Into<String>,
        resolved_by: impl Into<String>,
        confidence_in_decision: u8,
    ) -> Result<Self> {
        let resolution = Self {
            action_taken,
            selected_issue,
            user_reasoning: user_reasoning.into(),
            resolved_by: resolved_by.into(),
            resolved_at: Utc::now(),
            confidence_in_decision,
        };
        resolution.validate()?;
        Ok(resolution)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.confidence_in_decision) {
            return Err(EngineError::Validation(format!(
                "confidence_in_decision must be between 1 and 5, got {}",
                self.confidence_in_decision
            )));
        }
        if self.action_taken.requires_target()
            && self
                .selected_issue
                .as_ref()
                .map(|key| key.trim().is_empty())
                .unwrap_or(true)
        {
            return Err(EngineError::Validation(format!(
                "action '{}' requires a selected issue",
                self.action_taken
            )));
        }
        Ok(())
    }
}

/// Audit record written for every applied resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub resolution_id: Uuid,
    pub original_task_id: String,
    pub action: ResolutionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_issue_key: Option<String>,
    #[serde(default)]
    pub user_notes: String,
    pub resolved_at: DateTime<Utc>,
    /// Always false today; reserved for future auto-resolution policies.
    pub auto_resolved: bool,
}

/// Applies user decisions to analyses and keeps the audit trail.
pub struct ConflictResolutionManager {
    sink: Arc<dyn ResultSink>,
    applied: DashMap<String, ConflictResolution>,
}

impl ConflictResolutionManager {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self {
            sink,
            applied: DashMap::new(),
        }
    }

    /// Apply one decision per analysis, positionally paired.
    ///
    /// Validation is all-or-nothing: a count mismatch, an invalid decision or
    /// an already-resolved analysis rejects the whole batch before anything
    /// is touched. Application is per item and not rolled back.
    pub async fn resolve_conflicts(
        &self,
        analyses: &mut [DuplicateAnalysis],
        resolutions: Vec<UserResolution>,
    ) -> Result<Vec<ConflictResolution>> {
        if analyses.len() != resolutions.len() {
            return Err(EngineError::Validation(format!(
                "got {} resolutions for {} conflicts; each conflict needs exactly one decision",
                resolutions.len(),
                analyses.len()
            )));
        }
        for resolution in &resolutions {
            resolution.validate()?;
        }
        for analysis in analyses.iter() {
            if analysis.is_resolved() {
                return Err(EngineError::Validation(format!(
                    "analysis for task '{}' is already resolved",
                    analysis.task_id
                )));
            }
        }

        let mut records = Vec::with_capacity(resolutions.len());
        let mut persist_failures = Vec::new();

        for (analysis, resolution) in analyses.iter_mut().zip(resolutions) {
            let record = ConflictResolution {
                resolution_id: Uuid::new_v4(),
                original_task_id: analysis.task_id.clone(),
                action: resolution.action_taken,
                target_issue_key: resolution.selected_issue.clone(),
                user_notes: resolution.user_reasoning.clone(),
                resolved_at: resolution.resolved_at,
                auto_resolved: false,
            };
            // Cannot fail: the batch was checked for prior resolutions above
            // and each analysis appears once.
            analysis.attach_resolution(resolution)?;

            if let Err(err) = self.sink.record_resolution(&record).await {
                error!(
                    task_id = %record.original_task_id,
                    error = %err,
                    "failed to persist resolution"
                );
                persist_failures.push(record.original_task_id.clone());
            }

            ENGINE_METRICS.record_resolution(record.action.as_str());
            info!(
                task_id = %record.original_task_id,
                action = %record.action,
                target = record.target_issue_key.as_deref().unwrap_or("-"),
                "resolution applied"
            );
            self.applied
                .insert(record.original_task_id.clone(), record.clone());
            records.push(record);
        }

        if !persist_failures.is_empty() {
            return Err(EngineError::AnalysisFailed {
                task_id: persist_failures.join(", "),
                reason: "resolution applied but not persisted".to_string(),
            });
        }
        Ok(records)
    }

    /// Audit record for a task, if one was applied in this process.
    pub fn applied_resolution(&self, task_id: &str) -> Option<ConflictResolution> {
        self.applied.get(task_id).map(|entry| entry.clone())
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

//! Project-context factors and the boost they contribute to scoring.
//!
//! Boost weights:
//! - same epic: 0.2
//! - same sprint: 0.15
//! - same component: 0.1
//! - same assignee: 0.1
//! - same issue type: 0.05
//! - temporal proximity: up to 0.1
//!
//! The total boost is capped at [`MAX_CONTEXT_BOOST`]; the scorer consumes it
//! normalized to `[0, 1]`.

use crate::model::{CandidateIssue, NewTaskInput, ProjectContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on the summed context boost.
pub const MAX_CONTEXT_BOOST: f64 = 0.5;

/// Window over which a candidate's age still contributes proximity.
pub const TEMPORAL_WINDOW_DAYS: i64 = 30;

/// How the task reporter relates to the candidate reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterRelationship {
    Same,
    TeamMember,
    DifferentTeam,
    External,
    #[default]
    Unknown,
}

impl ReporterRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReporterRelationship::Same => "same",
            ReporterRelationship::TeamMember => "team_member",
            ReporterRelationship::DifferentTeam => "different_team",
            ReporterRelationship::External => "external",
            ReporterRelationship::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReporterRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which contextual signals line up between a new task and a candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextFactors {
    pub same_epic: bool,
    pub same_component: bool,
    pub same_sprint: bool,
    pub same_assignee: bool,
    pub same_issue_type: bool,
    /// 1.0 for a candidate created today, 0.0 at thirty days or older.
    pub temporal_proximity: f64,
    pub reporter_relationship: ReporterRelationship,
}

impl ContextFactors {
    /// Factors for two tasks of the same batch: no tracker context applies
    /// and both are brand new, so temporal proximity is full.
    pub fn same_batch() -> Self {
        Self {
            temporal_proximity: 1.0,
            ..Self::default()
        }
    }

    /// Summed boost, capped at [`MAX_CONTEXT_BOOST`].
    pub fn context_boost(&self) -> f64 {
        let mut boost = 0.0;
        if self.same_epic {
            boost += 0.2;
        }
        if self.same_component {
            boost += 0.1;
        }
        if self.same_sprint {
            boost += 0.15;
        }
        if self.same_assignee {
            boost += 0.1;
        }
        if self.same_issue_type {
            boost += 0.05;
        }
        boost += self.temporal_proximity.clamp(0.0, 1.0) * 0.1;
        boost.min(MAX_CONTEXT_BOOST)
    }

    /// Boost rescaled to `[0, 1]` for the weighted overall score.
    pub fn normalized(&self) -> f64 {
        self.context_boost() / MAX_CONTEXT_BOOST
    }
}

/// Derives [`ContextFactors`] from task, candidate and project context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextFactorAnalyzer;

impl ContextFactorAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compare a task against a candidate. `reference` is the analysis start
    /// instant; passing it explicitly keeps temporal decay deterministic for
    /// every candidate of one analysis.
    pub fn analyze(
        &self,
        task: &NewTaskInput,
        candidate: &CandidateIssue,
        context: &ProjectContext,
        reference: DateTime<Utc>,
    ) -> ContextFactors {
        let same_epic = match (&task.epic_key, &candidate.epic_key) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        };

        let same_component = task.components.iter().any(|tc| {
            candidate
                .components
                .iter()
                .any(|cc| cc.eq_ignore_ascii_case(tc))
        });

        // New work lands in the active sprint, so a candidate already there
        // shares the sprint.
        let same_sprint = match (context.active_sprint(), candidate.sprint_id) {
            (Some(active), Some(sprint_id)) => active.id == sprint_id,
            _ => false,
        };

        let same_assignee = match (&task.assignee, &candidate.assignee) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        };

        let same_issue_type = !task.issue_type.is_empty()
            && task.issue_type.eq_ignore_ascii_case(&candidate.issue_type);

        ContextFactors {
            same_epic,
            same_component,
            same_sprint,
            same_assignee,
            same_issue_type,
            temporal_proximity: temporal_proximity(candidate.created, reference),
            reporter_relationship: reporter_relationship(
                task.reporter.as_deref(),
                candidate.reporter.as_deref(),
            ),
        }
    }
}

/// Linear decay from 1.0 (created today) to 0.0 (thirty days or older).
/// Unknown creation dates contribute nothing; future dates clamp to 1.0.
fn temporal_proximity(created: Option<DateTime<Utc>>, reference: DateTime<Utc>) -> f64 {
    let Some(created) = created else {
        return 0.0;
    };
    let age_days = (reference - created).num_days();
    if age_days <= 0 {
        return 1.0;
    }
    if age_days >= TEMPORAL_WINDOW_DAYS {
        return 0.0;
    }
    1.0 - age_days as f64 / TEMPORAL_WINDOW_DAYS as f64
}

fn reporter_relationship(task: Option<&str>, candidate: Option<&str>) -> ReporterRelationship {
    match (task, candidate) {
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => ReporterRelationship::Same,
        (Some(_), Some(_)) => ReporterRelationship::DifferentTeam,
        _ => ReporterRelationship::Unknown,
    }
}

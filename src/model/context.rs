//! Project context: sprints, epics, components and issue types fetched from
//! the tracker. Used to compute context boosts during scoring and to rank
//! parent-epic suggestions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
    Future,
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintInfo {
    pub id: i64,
    pub name: String,
    pub state: SprintState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicInfo {
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
}

/// Everything the engine knows about the target project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_key: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
    #[serde(default)]
    pub sprints: Vec<SprintInfo>,
    #[serde(default)]
    pub epics: Vec<EpicInfo>,
    #[serde(default)]
    pub components: Vec<ComponentInfo>,
    #[serde(default)]
    pub issue_types: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl ProjectContext {
    pub fn new(project_key: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            project_name: project_name.into(),
            lead: None,
            sprints: Vec::new(),
            epics: Vec::new(),
            components: Vec::new(),
            issue_types: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    /// Minimal context for degraded mode, when the provider is unavailable.
    pub fn empty(project_key: impl Into<String>) -> Self {
        Self::new(project_key, "")
    }

    /// The sprint new work would land in, if one is running.
    pub fn active_sprint(&self) -> Option<&SprintInfo> {
        self.sprints.iter().find(|s| s.state == SprintState::Active)
    }
}

//! New-task input, produced upstream by transcript extraction and validated
//! here before any scoring runs.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Longest summary the tracker accepts.
pub const MAX_SUMMARY_LENGTH: usize = 255;

/// A task proposed for creation, not yet in the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTaskInput {
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub issue_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    /// Epic the task is expected to land under, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

impl NewTaskInput {
    /// Create a validated task input.
    pub fn new(
        summary: impl Into<String>,
        description: impl Into<String>,
        issue_type: impl Into<String>,
    ) -> Result<Self> {
        let task = Self {
            summary: summary.into(),
            description: description.into(),
            issue_type: issue_type.into(),
            assignee: None,
            reporter: None,
            epic_key: None,
            components: Vec::new(),
        };
        task.validate()?;
        Ok(task)
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_reporter(mut self, reporter: impl Into<String>) -> Self {
        self.reporter = Some(reporter.into());
        self
    }

    pub fn with_epic(mut self, epic_key: impl Into<String>) -> Self {
        self.epic_key = Some(epic_key.into());
        self
    }

    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.components = components;
        self
    }

    /// Boundary validation. Invalid input never reaches the scorer.
    pub fn validate(&self) -> Result<()> {
        if self.summary.trim().is_empty() {
            return Err(EngineError::Validation(
                "task summary must not be empty".to_string(),
            ));
        }
        let summary_chars = self.summary.chars().count();
        if summary_chars > MAX_SUMMARY_LENGTH {
            return Err(EngineError::Validation(format!(
                "task summary exceeds {} characters (got {})",
                MAX_SUMMARY_LENGTH, summary_chars
            )));
        }
        if self.issue_type.trim().is_empty() {
            return Err(EngineError::Validation(
                "task issue_type must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Summary and description combined, for full-text measures.
    pub fn full_text(&self) -> String {
        if self.description.is_empty() {
            self.summary.clone()
        } else {
            format!("{} {}", self.summary, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_task() {
        let task = NewTaskInput::new("Implement login API", "Create the endpoint", "Task")
            .unwrap()
            .with_assignee("john.doe")
            .with_epic("PROJ-100");
        assert_eq!(task.summary, "Implement login API");
        assert_eq!(task.assignee.as_deref(), Some("john.doe"));
        assert_eq!(task.epic_key.as_deref(), Some("PROJ-100"));
    }

    #[test]
    fn test_empty_summary_rejected() {
        let err = NewTaskInput::new("   ", "desc", "Task").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_overlong_summary_rejected() {
        let long = "x".repeat(MAX_SUMMARY_LENGTH + 1);
        let err = NewTaskInput::new(long, "", "Task").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_summary_limit_counts_characters_not_bytes() {
        // 200 chars but 400 bytes; must pass a character-based limit.
        let accented = "é".repeat(200);
        assert!(accented.len() > MAX_SUMMARY_LENGTH);
        let task = NewTaskInput::new(accented, "", "Task").unwrap();
        assert_eq!(task.summary.chars().count(), 200);

        let too_long = "é".repeat(MAX_SUMMARY_LENGTH + 1);
        let err = NewTaskInput::new(too_long, "", "Task").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_empty_issue_type_rejected() {
        let err = NewTaskInput::new("Summary", "", " ").unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_full_text_skips_empty_description() {
        let task = NewTaskInput::new("Fix header", "", "Bug").unwrap();
        assert_eq!(task.full_text(), "Fix header");
        let task = NewTaskInput::new("Fix header", "on mobile", "Bug").unwrap();
        assert_eq!(task.full_text(), "Fix header on mobile");
    }
}

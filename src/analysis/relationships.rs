//! Parent-epic suggestion: rank a project's epics against a proposed task
//! by lexical similarity of the epic summary to the task text.

use crate::model::{NewTaskInput, ProjectContext};
use crate::similarity::text;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Floor for suggesting an epic, lower than the duplicate inclusion floor.
const EPIC_SIMILARITY_FLOOR: f64 = 0.3;

const MAX_EPIC_SUGGESTIONS: usize = 3;

/// A candidate parent epic for a proposed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicSuggestion {
    pub epic_key: String,
    pub epic_summary: String,
    pub similarity_score: f64,
}

/// Rank the context's epics against the task text. Returns at most three
/// suggestions above the floor, best first.
pub fn suggest_epics(task: &NewTaskInput, context: &ProjectContext) -> Vec<EpicSuggestion> {
    let task_text = task.full_text();
    let mut suggestions: Vec<EpicSuggestion> = context
        .epics
        .iter()
        .filter_map(|epic| {
            let similarity = text::token_sort_ratio(&task_text, &epic.summary);
            if similarity > EPIC_SIMILARITY_FLOOR {
                Some(EpicSuggestion {
                    epic_key: epic.key.clone(),
                    epic_summary: epic.summary.clone(),
                    similarity_score: similarity,
                })
            } else {
                None
            }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
    });
    suggestions.truncate(MAX_EPIC_SUGGESTIONS);
    suggestions
}

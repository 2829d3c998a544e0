//! Weighted multi-factor similarity scoring. Every comparison in the engine,
//! task-to-issue and task-to-task, flows through [`SimilarityScorer`].

use crate::error::{EngineError, Result};
use crate::model::{CandidateIssue, NewTaskInput};
use crate::similarity::factors::ContextFactors;
use crate::similarity::{text, tokens};
use serde::{Deserialize, Serialize};

/// Keyword overlap only considers longer, domain-specific terms.
const KEYWORD_MIN_LENGTH: usize = 4;

/// Weighted contribution of each sub-score to the overall score.
/// Weights must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_title_weight")]
    pub title: f64,
    #[serde(default = "default_content_weight")]
    pub content: f64,
    #[serde(default = "default_semantic_weight")]
    pub semantic: f64,
    #[serde(default = "default_context_weight")]
    pub context: f64,
    #[serde(default = "default_keyword_weight")]
    pub keyword: f64,
}

fn default_title_weight() -> f64 {
    0.35
}

fn default_content_weight() -> f64 {
    0.25
}

fn default_semantic_weight() -> f64 {
    0.25
}

fn default_context_weight() -> f64 {
    0.10
}

fn default_keyword_weight() -> f64 {
    0.05
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title: default_title_weight(),
            content: default_content_weight(),
            semantic: default_semantic_weight(),
            context: default_context_weight(),
            keyword: default_keyword_weight(),
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("title", self.title),
            ("content", self.content),
            ("semantic", self.semantic),
            ("context", self.context),
            ("keyword", self.keyword),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Configuration(format!(
                    "scoring weight '{name}' must be in [0, 1], got {value}"
                )));
            }
        }
        let sum = self.title + self.content + self.semantic + self.context + self.keyword;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::Configuration(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// The six similarity measures for one comparison, all in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScores {
    pub overall_score: f64,
    pub title_similarity: f64,
    pub content_similarity: f64,
    pub semantic_similarity: f64,
    pub context_similarity: f64,
    pub keyword_overlap: f64,
}

impl SimilarityScores {
    /// Validating constructor for scores arriving from outside the scorer.
    /// Out-of-range values are rejected, never clamped.
    pub fn new(
        overall_score: f64,
        title_similarity: f64,
        content_similarity: f64,
        semantic_similarity: f64,
        context_similarity: f64,
        keyword_overlap: f64,
    ) -> Result<Self> {
        let scores = Self {
            overall_score,
            title_similarity,
            content_similarity,
            semantic_similarity,
            context_similarity,
            keyword_overlap,
        };
        scores.validate()?;
        Ok(scores)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("overall_score", self.overall_score),
            ("title_similarity", self.title_similarity),
            ("content_similarity", self.content_similarity),
            ("semantic_similarity", self.semantic_similarity),
            ("context_similarity", self.context_similarity),
            ("keyword_overlap", self.keyword_overlap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Validation(format!(
                    "similarity score '{name}' must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Label of the strongest sub-score. Ties resolve toward the earlier
    /// entry in weight order, so the result is deterministic.
    pub fn primary_match_reason(&self) -> &'static str {
        let labeled = [
            (self.title_similarity, "title similarity"),
            (self.content_similarity, "content similarity"),
            (self.semantic_similarity, "semantic meaning"),
            (self.context_similarity, "project context"),
            (self.keyword_overlap, "keyword overlap"),
        ];
        let mut best = labeled[0];
        for entry in labeled.iter().skip(1) {
            if entry.0 > best.0 {
                best = *entry;
            }
        }
        best.1
    }
}

/// Computes [`SimilarityScores`] from text measures and context factors.
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    weights: ScoringWeights,
}

impl SimilarityScorer {
    pub fn new(weights: ScoringWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a new task against an existing candidate issue. Deterministic:
    /// the same inputs always produce the same scores.
    pub fn score(
        &self,
        task: &NewTaskInput,
        candidate: &CandidateIssue,
        factors: &ContextFactors,
    ) -> SimilarityScores {
        let title = guarded_ratio(&task.summary, &candidate.summary);
        let content = guarded_ratio(&task.description, &candidate.description);
        let task_text = task.full_text();
        let candidate_text = candidate.full_text();
        let semantic = semantic_similarity(&task_text, &candidate_text);
        let keyword = keyword_overlap(&task_text, &candidate_text);
        self.compose(title, content, semantic, factors.normalized(), keyword)
    }

    /// Score two tasks of one batch against each other. No tracker context
    /// applies; both tasks are new, so temporal proximity is full.
    pub fn score_task_pair(&self, a: &NewTaskInput, b: &NewTaskInput) -> SimilarityScores {
        let mut factors = ContextFactors::same_batch();
        factors.same_assignee = match (&a.assignee, &b.assignee) {
            (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
            _ => false,
        };
        factors.same_issue_type =
            !a.issue_type.is_empty() && a.issue_type.eq_ignore_ascii_case(&b.issue_type);

        let title = guarded_ratio(&a.summary, &b.summary);
        let content = guarded_ratio(&a.description, &b.description);
        let a_text = a.full_text();
        let b_text = b.full_text();
        let semantic = semantic_similarity(&a_text, &b_text);
        let keyword = keyword_overlap(&a_text, &b_text);
        self.compose(title, content, semantic, factors.normalized(), keyword)
    }

    fn compose(
        &self,
        title: f64,
        content: f64,
        semantic: f64,
        context: f64,
        keyword: f64,
    ) -> SimilarityScores {
        let overall = (self.weights.title * title
            + self.weights.content * content
            + self.weights.semantic * semantic
            + self.weights.context * context
            + self.weights.keyword * keyword)
            .clamp(0.0, 1.0);

        SimilarityScores {
            overall_score: overall,
            title_similarity: title,
            content_similarity: content,
            semantic_similarity: semantic,
            context_similarity: context,
            keyword_overlap: keyword,
        }
    }
}

/// Token-sort ratio with the missing-field rule: a blank side contributes
/// zero similarity, so two empty descriptions never count as identical.
fn guarded_ratio(a: &str, b: &str) -> f64 {
    if a.trim().is_empty() || b.trim().is_empty() {
        return 0.0;
    }
    text::token_sort_ratio(a, b)
}

/// Word overlap over the full text with a length-ratio penalty: texts of very
/// different sizes are capped even when the shorter is fully contained.
fn semantic_similarity(a: &str, b: &str) -> f64 {
    let overlap = text::word_overlap(a, b);
    if overlap == 0.0 {
        return 0.0;
    }
    overlap * length_penalty(a, b)
}

fn keyword_overlap(a: &str, b: &str) -> f64 {
    let set_a = tokens::word_set(a, KEYWORD_MIN_LENGTH);
    let set_b = tokens::word_set(b, KEYWORD_MIN_LENGTH);
    tokens::jaccard(&set_a, &set_b)
}

fn length_penalty(a: &str, b: &str) -> f64 {
    let len_a = tokens::normalize(a).chars().count() as f64;
    let len_b = tokens::normalize(b).chars().count() as f64;
    if len_a == 0.0 || len_b == 0.0 {
        return 0.0;
    }
    let (shorter, longer) = if len_a < len_b {
        (len_a, len_b)
    } else {
        (len_b, len_a)
    };
    0.5 + 0.5 * shorter / longer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(summary: &str, description: &str) -> NewTaskInput {
        NewTaskInput::new(summary, description, "Task").unwrap()
    }

    fn full_factors() -> ContextFactors {
        ContextFactors {
            same_epic: true,
            same_component: true,
            same_sprint: true,
            same_assignee: true,
            same_issue_type: true,
            temporal_proximity: 1.0,
            ..ContextFactors::default()
        }
    }

    #[test]
    fn test_identical_inputs_score_one() {
        let scorer = SimilarityScorer::default();
        let t = task("Implement user login", "Create the login endpoint for customers");
        let c = CandidateIssue::new("PROJ-1", "Implement user login")
            .with_description("Create the login endpoint for customers");
        let scores = scorer.score(&t, &c, &full_factors());
        assert!((scores.overall_score - 1.0).abs() < 1e-9, "{scores:?}");
        assert_eq!(scores.title_similarity, 1.0);
        assert_eq!(scores.content_similarity, 1.0);
        assert_eq!(scores.context_similarity, 1.0);
    }

    #[test]
    fn test_all_scores_within_bounds() {
        let scorer = SimilarityScorer::default();
        let t = task("Fix checkout crash on submit", "Null pointer when the cart is empty");
        let c = CandidateIssue::new("PROJ-2", "Checkout page crashes")
            .with_description("Crash observed during payment submission");
        let scores = scorer.score(&t, &c, &ContextFactors::default());
        for value in [
            scores.overall_score,
            scores.title_similarity,
            scores.content_similarity,
            scores.semantic_similarity,
            scores.context_similarity,
            scores.keyword_overlap,
        ] {
            assert!((0.0..=1.0).contains(&value), "{scores:?}");
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = SimilarityScorer::default();
        let t = task("Implement login API", "OAuth based flow");
        let c = CandidateIssue::new("PROJ-3", "Implement authentication API")
            .with_description("OAuth based flow");
        let factors = ContextFactors {
            same_epic: true,
            temporal_proximity: 0.4,
            ..ContextFactors::default()
        };
        let first = scorer.score(&t, &c, &factors);
        let second = scorer.score(&t, &c, &factors);
        assert_eq!(first, second, "same inputs must produce bit-identical scores");
    }

    #[test]
    fn test_empty_descriptions_contribute_zero() {
        let scorer = SimilarityScorer::default();
        let t = task("Implement login", "");
        let c = CandidateIssue::new("PROJ-4", "Implement login");
        let scores = scorer.score(&t, &c, &ContextFactors::default());
        assert_eq!(
            scores.content_similarity, 0.0,
            "two empty descriptions must not count as identical"
        );
        assert_eq!(scores.title_similarity, 1.0);
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        assert!(SimilarityScores::new(0.5, 1.2, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(SimilarityScores::new(-0.1, 0.0, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(SimilarityScores::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_primary_match_reason_picks_maximum() {
        let scores = SimilarityScores::new(0.5, 0.2, 0.9, 0.3, 0.1, 0.4).unwrap();
        assert_eq!(scores.primary_match_reason(), "content similarity");
        let scores = SimilarityScores::new(0.5, 0.2, 0.3, 0.3, 0.8, 0.4).unwrap();
        assert_eq!(scores.primary_match_reason(), "project context");
    }

    #[test]
    fn test_primary_match_reason_tie_prefers_weight_order() {
        let scores = SimilarityScores::new(0.5, 0.7, 0.7, 0.7, 0.7, 0.7).unwrap();
        assert_eq!(scores.primary_match_reason(), "title similarity");
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = ScoringWeights {
            title: 0.5,
            content: 0.5,
            semantic: 0.5,
            context: 0.0,
            keyword: 0.0,
        };
        assert!(weights.validate().is_err());
        assert!(SimilarityScorer::new(weights).is_err());
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn test_length_penalty_caps_contained_text() {
        let short = "login endpoint";
        let long = "login endpoint plus a very long unrelated elaboration about \
                    deployment windows maintenance schedules and rollout phases";
        let penalized = semantic_similarity(short, long);
        let unpenalized = semantic_similarity(short, short);
        assert!(penalized < unpenalized);
        assert!(penalized < 0.6, "got {penalized}");
    }

    #[test]
    fn test_task_pair_near_identical_clears_similar_threshold() {
        let scorer = SimilarityScorer::default();
        let a = task("Add login form", "Create the login form for the web UI");
        let b = task("Add the login form UI", "Create the login form for the web UI");
        let scores = scorer.score_task_pair(&a, &b);
        assert!(scores.overall_score >= 0.7, "got {}", scores.overall_score);
    }

    #[test]
    fn test_task_pair_unrelated_scores_low() {
        let scorer = SimilarityScorer::default();
        let a = task("Research database optimization", "Evaluate slow queries and index usage");
        let b = task("Update onboarding email copy", "Refresh welcome text for trial accounts");
        let scores = scorer.score_task_pair(&a, &b);
        assert!(scores.overall_score < 0.5, "got {}", scores.overall_score);
    }

    #[test]
    fn test_task_pair_uses_full_temporal_proximity() {
        let scorer = SimilarityScorer::default();
        let a = task("Add export button", "CSV export for the report page");
        let b = task("Add export button", "CSV export for the report page");
        let scores = scorer.score_task_pair(&a, &b);
        // same_batch factors: temporal 0.1 plus same issue type 0.05 of max 0.5
        assert!((scores.context_similarity - 0.3).abs() < 1e-9, "{scores:?}");
        assert!(scores.overall_score >= 0.9, "got {}", scores.overall_score);
    }
}

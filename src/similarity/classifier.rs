//! Match classification. The score thresholds live here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall score at or above which two items are considered identical.
pub const IDENTICAL_THRESHOLD: f64 = 0.95;
/// Threshold for very similar matches (actionable duplicates start here).
pub const VERY_SIMILAR_THRESHOLD: f64 = 0.85;
/// Threshold for similar matches worth linking.
pub const SIMILAR_THRESHOLD: f64 = 0.70;
/// Threshold for loosely related matches.
pub const RELATED_THRESHOLD: f64 = 0.50;

/// Strength of a match, ordered weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Weak = 0,
    Related = 1,
    Similar = 2,
    VerySimilar = 3,
    Identical = 4,
}

impl MatchType {
    /// Classify an overall similarity score. Boundary values belong to the
    /// higher tier; classification is monotone in the score.
    pub fn from_score(score: f64) -> Self {
        if score >= IDENTICAL_THRESHOLD {
            MatchType::Identical
        } else if score >= VERY_SIMILAR_THRESHOLD {
            MatchType::VerySimilar
        } else if score >= SIMILAR_THRESHOLD {
            MatchType::Similar
        } else if score >= RELATED_THRESHOLD {
            MatchType::Related
        } else {
            MatchType::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Weak => "weak",
            MatchType::Related => "related",
            MatchType::Similar => "similar",
            MatchType::VerySimilar => "very_similar",
            MatchType::Identical => "identical",
        }
    }

    /// Matches strong enough to block blind issue creation.
    pub fn is_actionable(&self) -> bool {
        matches!(self, MatchType::Identical | MatchType::VerySimilar)
    }

    pub fn recommendation(&self) -> RecommendedAction {
        match self {
            MatchType::Identical => RecommendedAction::LikelyDuplicate,
            MatchType::VerySimilar => RecommendedAction::ReviewRequired,
            MatchType::Similar => RecommendedAction::ConsiderLinking,
            MatchType::Related | MatchType::Weak => RecommendedAction::CreateNew,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the engine suggests doing about a detected match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    LikelyDuplicate,
    ReviewRequired,
    ConsiderLinking,
    CreateNew,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::LikelyDuplicate => "likely_duplicate",
            RecommendedAction::ReviewRequired => "review_required",
            RecommendedAction::ConsiderLinking => "consider_linking",
            RecommendedAction::CreateNew => "create_new",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

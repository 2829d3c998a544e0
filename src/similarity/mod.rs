//! Similarity measures: lexical text ratios, context factor analysis and the
//! weighted scorer that combines them, plus match classification.

pub mod classifier;
pub mod factors;
pub mod scorer;
pub mod text;
pub mod tokens;

pub use classifier::{MatchType, RecommendedAction};
pub use factors::{ContextFactorAnalyzer, ContextFactors, ReporterRelationship};
pub use scorer::{ScoringWeights, SimilarityScorer, SimilarityScores};

//! Engine configuration.
//!
//! Layered loading: optional TOML file (`config/engine.toml`, overridable via
//! `DEDUPE_CONFIG`) under `DEDUPE_*` environment variables. Every section has
//! serde defaults so an empty source yields a working configuration.

use crate::error::{EngineError, Result};
use crate::similarity::ScoringWeights;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Candidate search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Per-strategy result cap passed to the provider.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Whether resolved/closed issues are searched too.
    #[serde(default)]
    pub include_resolved: bool,
    /// How many extracted terms the keyword strategy queries with.
    #[serde(default = "default_max_keyword_terms")]
    pub max_keyword_terms: usize,
    /// Deadline for each search strategy and the context fetch.
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,
}

fn default_max_results() -> usize {
    50
}

fn default_max_keyword_terms() -> usize {
    5
}

fn default_strategy_timeout_ms() -> u64 {
    10_000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            include_resolved: false,
            max_keyword_terms: default_max_keyword_terms(),
            strategy_timeout_ms: default_strategy_timeout_ms(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(EngineError::Configuration(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        if self.max_keyword_terms == 0 {
            return Err(EngineError::Configuration(
                "search.max_keyword_terms must be at least 1".to_string(),
            ));
        }
        if self.strategy_timeout_ms == 0 {
            return Err(EngineError::Configuration(
                "search.strategy_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Analysis pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Candidates scoring below this never become similar issues.
    #[serde(default = "default_inclusion_floor")]
    pub inclusion_floor: f64,
    /// Minimum overall score for an in-batch cross-reference.
    #[serde(default = "default_cross_reference_threshold")]
    pub cross_reference_threshold: f64,
    /// Largest batch the bulk analyzer accepts.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Concurrent per-task analyses in bulk mode.
    #[serde(default = "default_max_concurrent_analyses")]
    pub max_concurrent_analyses: usize,
}

fn default_inclusion_floor() -> f64 {
    0.3
}

fn default_cross_reference_threshold() -> f64 {
    0.7
}

fn default_max_batch_size() -> usize {
    10
}

fn default_max_concurrent_analyses() -> usize {
    3
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            inclusion_floor: default_inclusion_floor(),
            cross_reference_threshold: default_cross_reference_threshold(),
            max_batch_size: default_max_batch_size(),
            max_concurrent_analyses: default_max_concurrent_analyses(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.inclusion_floor) {
            return Err(EngineError::Configuration(format!(
                "analysis.inclusion_floor must be in [0, 1], got {}",
                self.inclusion_floor
            )));
        }
        if !(0.0..=1.0).contains(&self.cross_reference_threshold) {
            return Err(EngineError::Configuration(format!(
                "analysis.cross_reference_threshold must be in [0, 1], got {}",
                self.cross_reference_threshold
            )));
        }
        if self.max_batch_size == 0 {
            return Err(EngineError::Configuration(
                "analysis.max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_analyses == 0 {
            return Err(EngineError::Configuration(
                "analysis.max_concurrent_analyses must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// TTL cache over the project context provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextCacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    64
}

impl Default for ContextCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_capacity: default_cache_capacity(),
        }
    }
}

impl ContextCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(EngineError::Configuration(
                "context_cache.max_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub context_cache: ContextCacheConfig,
}

impl EngineConfig {
    /// Load from the optional config file and `DEDUPE_*` environment
    /// variables (`__` separates section and key, e.g.
    /// `DEDUPE_ANALYSIS__MAX_BATCH_SIZE=5`).
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let file = std::env::var("DEDUPE_CONFIG").unwrap_or_else(|_| "config/engine".to_string());
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix("DEDUPE").separator("__"))
            .build()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;

        let cfg: EngineConfig = settings
            .try_deserialize()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.search.validate()?;
        self.analysis.validate()?;
        self.context_cache.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.search.max_results, 50);
        assert_eq!(cfg.search.max_keyword_terms, 5);
        assert!(!cfg.search.include_resolved);
        assert!((cfg.analysis.inclusion_floor - 0.3).abs() < 1e-9);
        assert!((cfg.analysis.cross_reference_threshold - 0.7).abs() < 1e-9);
        assert_eq!(cfg.analysis.max_batch_size, 10);
        assert_eq!(cfg.context_cache.ttl_secs, 300);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoringWeights::default();
        let sum = weights.title + weights.content + weights.semantic + weights.context + weights.keyword;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [analysis]
                max_batch_size = 5
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg: EngineConfig = settings.try_deserialize().unwrap();
        assert_eq!(cfg.analysis.max_batch_size, 5);
        assert_eq!(cfg.analysis.max_concurrent_analyses, 3);
        assert_eq!(cfg.search.max_results, 50);
    }

    #[test]
    fn test_invalid_floor_rejected() {
        let cfg = EngineConfig {
            analysis: AnalysisConfig {
                inclusion_floor: 1.5,
                ..AnalysisConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let cfg = EngineConfig {
            analysis: AnalysisConfig {
                max_batch_size: 0,
                ..AnalysisConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unbalanced_weights_rejected() {
        let cfg = EngineConfig {
            scoring: ScoringWeights {
                title: 0.9,
                content: 0.9,
                semantic: 0.0,
                context: 0.0,
                keyword: 0.0,
            },
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

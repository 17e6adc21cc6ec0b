//! Configuration types

use crate::{ConfigError, RuleError, RuleResult};
use serde::{Deserialize, Serialize};

/// Engine limits and caching.
///
/// The parser and evaluator themselves are unbounded; these limits are what
/// the `RuleEngine` facade applies to untrusted expression text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum expression length in bytes.
    pub max_source_len: usize,
    /// Maximum nesting of parentheses, brackets and call arguments.
    pub max_nesting_depth: usize,
    /// Parsed expressions kept in memory. 0 disables caching.
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_source_len: 4096,
            max_nesting_depth: 32,
            cache_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `RULEGATE_MAX_SOURCE_LEN` (default: 4096)
    /// - `RULEGATE_MAX_NESTING_DEPTH` (default: 32)
    /// - `RULEGATE_CACHE_CAPACITY` (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_source_len: std::env::var("RULEGATE_MAX_SOURCE_LEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_source_len),
            max_nesting_depth: std::env::var("RULEGATE_MAX_NESTING_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_nesting_depth),
            cache_capacity: std::env::var("RULEGATE_CACHE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_capacity),
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> RuleResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| {
            RuleError::Config(ConfigError::Parse {
                reason: e.to_string(),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_source_len > 0
    /// - max_nesting_depth > 0
    pub fn validate(&self) -> RuleResult<()> {
        if self.max_source_len == 0 {
            return Err(RuleError::Config(ConfigError::InvalidValue {
                field: "max_source_len".to_string(),
                value: self.max_source_len.to_string(),
                reason: "max_source_len must be greater than 0".to_string(),
            }));
        }

        if self.max_nesting_depth == 0 {
            return Err(RuleError::Config(ConfigError::InvalidValue {
                field: "max_nesting_depth".to_string(),
                value: self.max_nesting_depth.to_string(),
                reason: "max_nesting_depth must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }
}

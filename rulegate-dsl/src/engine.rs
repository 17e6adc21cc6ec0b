//! Rule engine facade: size limits and a shared parse cache
//!
//! `parse` and `evaluate` are unbounded and uncached. Hosts evaluating
//! tenant-authored rules go through [`RuleEngine`], which enforces
//! [`EngineConfig`] limits and keeps parsed expressions keyed by source.

use crate::evaluator::{evaluate_parsed, EvaluateOptions};
use crate::parser::{parse_with_max_depth, ParsedExpression};
use rulegate_core::{Conditional, EngineConfig, EvaluationContext, RuleError, RuleResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe engine. Clones share the cache.
#[derive(Clone)]
pub struct RuleEngine {
    config: EngineConfig,
    cache: Arc<RwLock<HashMap<String, Arc<ParsedExpression>>>>,
}

impl RuleEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig) -> RuleResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse `source`, reusing a cached result when available.
    pub fn parse(&self, source: &str) -> RuleResult<Arc<ParsedExpression>> {
        if source.len() > self.config.max_source_len {
            return Err(RuleError::SourceTooLong {
                len: source.len(),
                max: self.config.max_source_len,
            });
        }

        if self.config.cache_capacity > 0 {
            let cache = self.cache.read().map_err(|_| RuleError::CachePoisoned)?;
            if let Some(parsed) = cache.get(source) {
                tracing::trace!(source, "Expression cache hit");
                return Ok(Arc::clone(parsed));
            }
        }

        let parsed = Arc::new(parse_with_max_depth(source, self.config.max_nesting_depth)?);
        tracing::debug!(
            source,
            identifiers = parsed.identifiers.len(),
            functions = parsed.functions.len(),
            "Expression parsed"
        );

        if self.config.cache_capacity > 0 {
            let mut cache = self.cache.write().map_err(|_| RuleError::CachePoisoned)?;
            if cache.len() >= self.config.cache_capacity {
                tracing::debug!(
                    capacity = self.config.cache_capacity,
                    "Expression cache full, clearing"
                );
                cache.clear();
            }
            cache.insert(source.to_string(), Arc::clone(&parsed));
        }

        Ok(parsed)
    }

    /// Parse (or reuse) and evaluate `source`.
    pub fn evaluate(
        &self,
        source: &str,
        context: &EvaluationContext,
        options: &EvaluateOptions<'_>,
    ) -> RuleResult<bool> {
        let parsed = self.parse(source)?;
        let result = evaluate_parsed(&parsed, context, options)?;
        tracing::debug!(source, result, "Expression evaluated");
        Ok(result)
    }

    /// Evaluate a stored rule's condition. A rule without one always applies.
    pub fn evaluate_rule<R: Conditional + ?Sized>(
        &self,
        rule: &R,
        context: &EvaluationContext,
        options: &EvaluateOptions<'_>,
    ) -> RuleResult<bool> {
        match rule.condition() {
            Some(source) => self.evaluate(source, context, options),
            None => Ok(true),
        }
    }

    /// Number of cached expressions.
    pub fn cached_len(&self) -> RuleResult<usize> {
        let cache = self.cache.read().map_err(|_| RuleError::CachePoisoned)?;
        Ok(cache.len())
    }

    pub fn clear_cache(&self) -> RuleResult<()> {
        self.cache
            .write()
            .map_err(|_| RuleError::CachePoisoned)?
            .clear();
        Ok(())
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// Rule Configuration Cache
//
// Time-based cache in front of any RuleRepository. The whole active rule list is
// loaded once per TTL and lookups are filtered in memory, so the cache size is
// bounded by the rule table, not by the targets callers ask about. No lock is
// held while the underlying store is queried. Failed loads are never cached.

use crate::pricing::{
    error::PricingResult,
    metrics::PerformanceMetrics,
    repository::{DiscountRule, RuleRepository},
    types::RuleType,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default time-to-live for the cached rule list (60 seconds)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedRules {
    rules: Arc<Vec<DiscountRule>>,
    loaded_at: Instant,
}

impl CachedRules {
    fn is_stale(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() > ttl
    }
}

/// Caching decorator for a [`RuleRepository`]
pub struct CachedRuleRepository {
    inner: Arc<dyn RuleRepository>,
    cache: RwLock<Option<CachedRules>>,
    cache_ttl: Duration,
    metrics: Option<PerformanceMetrics>,
}

impl CachedRuleRepository {
    pub fn new(inner: Arc<dyn RuleRepository>, cache_ttl: Duration) -> Self {
        Self {
            inner,
            cache: RwLock::new(None),
            cache_ttl,
            metrics: None,
        }
    }

    /// Create a cache that reports hits and misses to `metrics`
    pub fn with_metrics(
        inner: Arc<dyn RuleRepository>,
        cache_ttl: Duration,
        metrics: PerformanceMetrics,
    ) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new(inner, cache_ttl)
        }
    }

    fn record_cache_hit(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_cache_hit();
        }
    }

    fn record_cache_miss(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_cache_miss();
        }
    }

    /// Drop the cached rule list; the next lookup reloads it
    pub async fn invalidate_all(&self) {
        let mut cache = self.cache.write().await;
        let dropped = cache.take().map(|cached| cached.rules.len()).unwrap_or(0);
        tracing::info!("Invalidated {} cached discount rules", dropped);
    }

    /// Number of rules currently held, zero when nothing is loaded
    pub async fn cached_rules(&self) -> usize {
        self.cache
            .read()
            .await
            .as_ref()
            .map(|cached| cached.rules.len())
            .unwrap_or(0)
    }

    async fn active_rules(&self) -> PricingResult<Arc<Vec<DiscountRule>>> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if !cached.is_stale(self.cache_ttl) {
                    self.record_cache_hit();
                    return Ok(cached.rules.clone());
                }
            }
        }

        self.record_cache_miss();
        tracing::debug!("Rule cache miss, loading active rules");

        let rules = Arc::new(self.inner.list_active_rules().await?);

        let mut cache = self.cache.write().await;
        *cache = Some(CachedRules {
            rules: rules.clone(),
            loaded_at: Instant::now(),
        });

        Ok(rules)
    }
}

#[async_trait]
impl RuleRepository for CachedRuleRepository {
    async fn find_active_rules(
        &self,
        rule_type: RuleType,
        target: Option<&str>,
    ) -> PricingResult<Vec<DiscountRule>> {
        let rules = self.active_rules().await?;
        Ok(rules
            .iter()
            .filter(|rule| rule.matches(rule_type, target))
            .cloned()
            .collect())
    }

    async fn list_active_rules(&self) -> PricingResult<Vec<DiscountRule>> {
        let rules = self.active_rules().await?;
        Ok(rules.to_vec())
    }
}

// Performance Metrics for checkout pricing
//
// Tracks pricing latency, rule lookup health, cache effectiveness and which
// strategy wins, so misconfigured or unreachable rule stores show up quickly.

use crate::pricing::types::StrategyKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Threshold for slow pricing calls (100ms)
const SLOW_OPERATION_THRESHOLD_MS: u64 = 100;

/// Performance metrics for the pricing system
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    // Cache metrics
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,

    // Pricing calls
    pricing_calculations: AtomicU64,
    total_pricing_time_us: AtomicU64,
    slow_pricing_calculations: AtomicU64,

    // Collaborator health
    rule_lookups: AtomicU64,
    lookup_failures: AtomicU64,
    enrichment_failures: AtomicU64,

    // Indexed by StrategyKind priority order
    wins: [AtomicU64; 5],
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rule_lookup(&self) {
        self.inner.rule_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_failure(&self) {
        self.inner.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enrichment_failure(&self) {
        self.inner.enrichment_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count the strategy that won a pricing call
    pub fn record_win(&self, kind: StrategyKind) {
        self.inner.wins[Self::win_index(kind)].fetch_add(1, Ordering::Relaxed);
    }

    fn win_index(kind: StrategyKind) -> usize {
        match kind {
            StrategyKind::PremiumMember => 0,
            StrategyKind::Student => 1,
            StrategyKind::BookGenre => 2,
            StrategyKind::Bundle => 3,
            StrategyKind::NoDiscount => 4,
        }
    }

    /// Get cache hit rate (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.inner.cache_hits.load(Ordering::Relaxed);
        let misses = self.inner.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Start timing a pricing calculation; recorded when the timer drops
    pub fn start_pricing_calculation(&self) -> OperationTimer {
        OperationTimer {
            start: Instant::now(),
            metrics: self.clone(),
        }
    }

    fn record_pricing_calculation(&self, duration: Duration) {
        self.inner.pricing_calculations.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_pricing_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_OPERATION_THRESHOLD_MS {
            self.inner.slow_pricing_calculations.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow pricing calculation: {}ms", duration.as_millis());
        }
    }

    /// Get average pricing calculation time in milliseconds
    pub fn avg_pricing_time_ms(&self) -> f64 {
        let count = self.inner.pricing_calculations.load(Ordering::Relaxed);
        let total_us = self.inner.total_pricing_time_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    pub fn wins(&self, kind: StrategyKind) -> u64 {
        self.inner.wins[Self::win_index(kind)].load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            cache_hit_rate: self.cache_hit_rate(),
            cache_hits: self.inner.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.inner.cache_misses.load(Ordering::Relaxed),
            pricing_calculations: self.inner.pricing_calculations.load(Ordering::Relaxed),
            avg_pricing_time_ms: self.avg_pricing_time_ms(),
            slow_pricing_calculations: self.inner.slow_pricing_calculations.load(Ordering::Relaxed),
            rule_lookups: self.inner.rule_lookups.load(Ordering::Relaxed),
            lookup_failures: self.inner.lookup_failures.load(Ordering::Relaxed),
            enrichment_failures: self.inner.enrichment_failures.load(Ordering::Relaxed),
            wins: StrategyKind::ALL
                .iter()
                .map(|kind| (*kind, self.wins(*kind)))
                .collect(),
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Pricing Performance Metrics:\n\
             Cache: {:.1}% hit rate ({} hits, {} misses)\n\
             Pricing: {} calculations, avg {:.2}ms, {} slow\n\
             Lookups: {} rule lookups, {} failures, {} enrichment failures",
            summary.cache_hit_rate * 100.0,
            summary.cache_hits,
            summary.cache_misses,
            summary.pricing_calculations,
            summary.avg_pricing_time_ms,
            summary.slow_pricing_calculations,
            summary.rule_lookups,
            summary.lookup_failures,
            summary.enrichment_failures,
        );
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer for a pricing call
pub struct OperationTimer {
    start: Instant,
    metrics: PerformanceMetrics,
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        self.metrics.record_pricing_calculation(self.start.elapsed());
    }
}

/// Summary of performance metrics
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub cache_hit_rate: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub pricing_calculations: u64,
    pub avg_pricing_time_ms: f64,
    pub slow_pricing_calculations: u64,
    pub rule_lookups: u64,
    pub lookup_failures: u64,
    pub enrichment_failures: u64,
    pub wins: Vec<(StrategyKind, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = PerformanceMetrics::new();
        assert_eq!(metrics.cache_hit_rate(), 0.0);
        assert_eq!(metrics.avg_pricing_time_ms(), 0.0);
    }

    #[test]
    fn test_cache_metrics() {
        let metrics = PerformanceMetrics::new();

        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        assert_eq!(metrics.cache_hit_rate(), 2.0 / 3.0);
    }

    #[test]
    fn test_operation_timer() {
        let metrics = PerformanceMetrics::new();

        {
            let _timer = metrics.start_pricing_calculation();
            thread::sleep(Duration::from_millis(10));
        }

        let summary = metrics.summary();
        assert_eq!(summary.pricing_calculations, 1);
        assert!(summary.avg_pricing_time_ms >= 10.0);
    }

    #[test]
    fn test_slow_operation_detection() {
        let metrics = PerformanceMetrics::new();

        {
            let _timer = metrics.start_pricing_calculation();
            thread::sleep(Duration::from_millis(150));
        }

        assert_eq!(metrics.summary().slow_pricing_calculations, 1);
    }

    #[test]
    fn test_win_counts() {
        let metrics = PerformanceMetrics::new();
        metrics.record_win(StrategyKind::Student);
        metrics.record_win(StrategyKind::Student);
        metrics.record_win(StrategyKind::NoDiscount);

        assert_eq!(metrics.wins(StrategyKind::Student), 2);
        assert_eq!(metrics.wins(StrategyKind::NoDiscount), 1);
        assert_eq!(metrics.wins(StrategyKind::PremiumMember), 0);

        let summary = metrics.summary();
        assert_eq!(summary.wins.len(), 5);
        assert_eq!(summary.wins[1], (StrategyKind::Student, 2));
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = PerformanceMetrics::new();
        let clone = metrics.clone();
        clone.record_rule_lookup();
        clone.record_lookup_failure();
        clone.record_enrichment_failure();

        let summary = metrics.summary();
        assert_eq!(summary.rule_lookups, 1);
        assert_eq!(summary.lookup_failures, 1);
        assert_eq!(summary.enrichment_failures, 1);
    }
}

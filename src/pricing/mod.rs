// Checkout Pricing Module
//
// Selects the single best discount for a bookstore checkout. Candidate discounts
// come from a closed set of strategies (premium membership, student age, book
// genre, bundle size) whose values are read from externally managed rule
// configuration. Discounts never stack: the largest one wins.
//
// The core only reads. Rules, genres and birth dates are reached through the
// collaborator traits in `repository`; logging goes through `tracing`.

pub mod config_store;
pub mod context;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pg_store;
pub mod price_calculator;
pub mod repository;
pub mod strategy;
pub mod types;

pub use config_store::{CachedRuleRepository, DEFAULT_CACHE_TTL};
pub use context::{age_on, CartLine, OrderContext, OrderContextBuilder};
pub use engine::{SelectedDiscount, SelectionEngine};
pub use error::{ErrorResponse, PricingError, PricingResult};
pub use metrics::{MetricsSummary, PerformanceMetrics};
pub use pg_store::PgPricingStore;
pub use price_calculator::PriceCalculator;
pub use repository::{
    BookCatalog, CustomerDirectory, DiscountRule, InMemoryPricingStore, RuleRepository,
};
pub use strategy::DiscountResult;
pub use types::{DiscountKind, MembershipTier, RuleType, StrategyKind};

// Pricing Facade - Orchestrator
//
// Validates the context, fills in missing genres and age, runs the selection
// engine and derives the final price.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Result of pricing one checkout
#[derive(Debug, Clone, Serialize)]
pub struct PricingOutcome {
    /// Correlates this quote with its log lines
    pub quote_id: Uuid,
    pub subtotal: Decimal,
    pub discount: DiscountResult,
    pub final_price: Decimal,
    /// Every strategy's candidate, in priority order
    pub candidates: Vec<DiscountResult>,
}

/// Pricing Facade
///
/// Entry point used by checkout. Collaborators are injected so the same facade
/// runs against PostgreSQL in production and the in-memory store in tests.
#[derive(Clone)]
pub struct PricingFacade {
    engine: SelectionEngine,
    catalog: Arc<dyn BookCatalog>,
    directory: Arc<dyn CustomerDirectory>,
    metrics: PerformanceMetrics,
}

impl PricingFacade {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        catalog: Arc<dyn BookCatalog>,
        directory: Arc<dyn CustomerDirectory>,
        metrics: PerformanceMetrics,
    ) -> Self {
        Self {
            engine: SelectionEngine::new(rules, metrics.clone()),
            catalog,
            directory,
            metrics,
        }
    }

    /// Build a facade whose three collaborators are one in-memory store
    pub fn in_memory(store: InMemoryPricingStore) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store, PerformanceMetrics::new())
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Every active discount rule, as the selection engine currently sees it
    pub async fn active_rules(&self) -> PricingResult<Vec<DiscountRule>> {
        self.engine.rules().list_active_rules().await
    }

    /// Price a checkout, deriving ages relative to today's date (UTC)
    pub async fn price_checkout(&self, context: OrderContext) -> PricingResult<PricingOutcome> {
        self.price_checkout_on(context, Utc::now().date_naive()).await
    }

    /// Price a checkout, deriving ages relative to `today`
    ///
    /// Only validation errors are returned. Collaborator failures during enrichment
    /// or rule lookup downgrade the affected input to "unknown" or "not applicable".
    pub async fn price_checkout_on(
        &self,
        context: OrderContext,
        today: NaiveDate,
    ) -> PricingResult<PricingOutcome> {
        context.validate()?;

        let _timer = self.metrics.start_pricing_calculation();
        let quote_id = Uuid::new_v4();

        let context = self.enrich(context, today).await;
        let selected = self.engine.select(&context).await;

        let subtotal = context.subtotal();
        let final_price = PriceCalculator::final_price(subtotal, selected.winner.amount);

        self.metrics.record_win(selected.winner.kind);
        tracing::info!(
            "Quote {}: subtotal {}, discount {} ({}), final {}",
            quote_id,
            subtotal,
            selected.winner.amount,
            selected.winner.code,
            final_price
        );

        Ok(PricingOutcome {
            quote_id,
            subtotal,
            discount: selected.winner,
            final_price,
            candidates: selected.candidates,
        })
    }

    /// Fill in missing genres and age; failures leave the field unknown
    async fn enrich(&self, context: OrderContext, today: NaiveDate) -> OrderContext {
        let mut genres = HashMap::new();
        for item_id in context.items_missing_genre() {
            match self.catalog.genre_of(item_id).await {
                Ok(Some(genre)) => {
                    genres.insert(item_id.to_string(), genre);
                }
                Ok(None) => {
                    tracing::debug!("No genre on record for item {}", item_id);
                }
                Err(e) => {
                    self.metrics.record_enrichment_failure();
                    tracing::warn!("Genre lookup for item {} failed: {}", item_id, e);
                }
            }
        }

        let age = match (context.age(), context.customer_id()) {
            (None, Some(customer_id)) => self.resolve_age(customer_id, today).await,
            _ => None,
        };

        if genres.is_empty() && age.is_none() {
            return context;
        }
        context.enriched(&genres, age)
    }

    async fn resolve_age(&self, customer_id: i64, today: NaiveDate) -> Option<u32> {
        match self.directory.birth_date_of(customer_id).await {
            Ok(Some(birth_date)) => {
                let age = age_on(birth_date, today);
                if age.is_none() {
                    tracing::warn!(
                        "Customer {} has a birth date in the future: {}",
                        customer_id,
                        birth_date
                    );
                }
                age
            }
            Ok(None) => None,
            Err(e) => {
                self.metrics.record_enrichment_failure();
                tracing::warn!("Birth date lookup for customer {} failed: {}", customer_id, e);
                None
            }
        }
    }
}

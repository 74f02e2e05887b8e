// HTTP handlers for checkout pricing endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pricing::{
    DiscountResult, DiscountRule, MembershipTier, MetricsSummary, OrderContext, PriceCalculator, PricingError,
    PricingOutcome, PricingResult,
};
use crate::validation::{validate_item_id, validate_non_negative_amount};

/// One cart line of a checkout request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckoutItemRequest {
    /// Catalog identifier (ISBN)
    #[schema(example = "978-0134685991")]
    #[validate(
        length(min = 1, max = 64, message = "Item id must be 1 to 64 characters"),
        custom = "validate_item_id"
    )]
    pub item_id: String,

    #[schema(example = 1)]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,

    /// Known genre; looked up in the catalog when absent
    #[schema(example = "Programming")]
    #[validate(length(min = 1, max = 64, message = "Genre must be 1 to 64 characters"))]
    pub genre: Option<String>,

    /// Needed on every line when the request carries no subtotal
    #[validate(custom = "validate_non_negative_amount")]
    pub unit_price: Option<Decimal>,
}

/// Request DTO for pricing a checkout
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    /// Explicit subtotal; computed from line prices when absent
    #[validate(custom = "validate_non_negative_amount")]
    pub subtotal: Option<Decimal>,

    #[serde(default)]
    pub tier: MembershipTier,

    /// Used to derive the age from the customer's birth date
    pub customer_id: Option<i64>,

    #[validate(range(max = 150, message = "Age is out of range"))]
    pub age: Option<u32>,

    #[serde(default)]
    #[validate]
    pub items: Vec<CheckoutItemRequest>,
}

impl CheckoutRequest {
    /// Subtotal of the request: the explicit one, or the sum of priced lines
    pub fn resolve_subtotal(&self) -> PricingResult<Decimal> {
        if let Some(subtotal) = self.subtotal {
            return Ok(subtotal);
        }

        if self.items.is_empty() {
            return Err(PricingError::Validation(
                "Either a subtotal or priced items are required".to_string(),
            ));
        }

        let line_totals = self
            .items
            .iter()
            .map(|item| {
                let price = item.unit_price.ok_or_else(|| {
                    PricingError::Validation(format!(
                        "Item {} has no unit price and no subtotal was given",
                        item.item_id
                    ))
                })?;
                PriceCalculator::line_total(item.quantity, price)
            })
            .collect::<PricingResult<Vec<Decimal>>>()?;

        PriceCalculator::subtotal(&line_totals)
    }

    pub fn into_context(self) -> PricingResult<OrderContext> {
        let subtotal = self.resolve_subtotal()?;

        let mut builder = OrderContext::builder(subtotal)
            .tier(self.tier)
            .age(self.age)
            .customer_id(self.customer_id);
        for item in self.items {
            builder = builder.line(item.item_id, item.quantity, item.genre);
        }

        Ok(builder.build())
    }
}

/// Response DTO for a priced checkout
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub quote_id: Uuid,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    #[schema(example = "Premium Member")]
    pub discount_label: String,
    #[schema(example = "PREMIUM")]
    pub discount_code: String,
    pub final_price: Decimal,
    pub candidates: Vec<DiscountResult>,
}

impl From<PricingOutcome> for CheckoutResponse {
    fn from(outcome: PricingOutcome) -> Self {
        Self {
            quote_id: outcome.quote_id,
            subtotal: outcome.subtotal,
            discount_amount: outcome.discount.amount,
            discount_label: outcome.discount.label,
            discount_code: outcome.discount.code,
            final_price: outcome.final_price,
            candidates: outcome.candidates,
        }
    }
}

/// Response DTO for pricing metrics
#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsResponse {
    pub pricing_calculations: u64,
    pub avg_pricing_time_ms: f64,
    pub slow_pricing_calculations: u64,
    pub rule_lookups: u64,
    pub lookup_failures: u64,
    pub enrichment_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    /// Win count per strategy code
    pub wins: BTreeMap<String, u64>,
}

impl From<MetricsSummary> for MetricsResponse {
    fn from(summary: MetricsSummary) -> Self {
        Self {
            pricing_calculations: summary.pricing_calculations,
            avg_pricing_time_ms: summary.avg_pricing_time_ms,
            slow_pricing_calculations: summary.slow_pricing_calculations,
            rule_lookups: summary.rule_lookups,
            lookup_failures: summary.lookup_failures,
            enrichment_failures: summary.enrichment_failures,
            cache_hits: summary.cache_hits,
            cache_misses: summary.cache_misses,
            cache_hit_rate: summary.cache_hit_rate,
            wins: summary
                .wins
                .into_iter()
                .map(|(kind, count)| (kind.code().to_string(), count))
                .collect(),
        }
    }
}

/// Response DTO for cache invalidation
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheInvalidationResponse {
    /// False when the service runs without a rule cache
    pub invalidated: bool,
}

/// Handler for POST /api/pricing/checkout
/// Selects the best discount for a checkout and returns the final price
#[utoipa::path(
    post,
    path = "/api/pricing/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout priced", body = CheckoutResponse),
        (status = 400, description = "Invalid checkout", body = String, example = json!({"error_code": "VALIDATION_ERROR", "message": "Validation failed: Subtotal must be non-negative, got -1"}))
    ),
    tag = "pricing"
)]
pub async fn price_checkout_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, PricingError> {
    request.validate()?;

    let context = request.into_context()?;
    tracing::debug!(
        "Pricing checkout: subtotal {}, tier {}, {} lines",
        context.subtotal(),
        context.tier(),
        context.lines().len()
    );

    let outcome = state.pricing.price_checkout(context).await?;
    Ok(Json(outcome.into()))
}

/// Handler for GET /api/pricing/metrics
/// Returns in-process pricing counters
#[utoipa::path(
    get,
    path = "/api/pricing/metrics",
    responses(
        (status = 200, description = "Current pricing metrics", body = MetricsResponse)
    ),
    tag = "pricing"
)]
pub async fn get_metrics_handler(State(state): State<crate::AppState>) -> Json<MetricsResponse> {
    let metrics = state.pricing.metrics();
    metrics.log_summary();
    Json(metrics.summary().into())
}

/// Handler for GET /api/pricing/discounts
/// Lists the active discount rules the engine selects from
#[utoipa::path(
    get,
    path = "/api/pricing/discounts",
    responses(
        (status = 200, description = "Active discount rules ordered by id", body = Vec<DiscountRule>),
        (status = 502, description = "Rule store unavailable", body = String)
    ),
    tag = "pricing"
)]
pub async fn list_discounts_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<DiscountRule>>, PricingError> {
    let rules = state.pricing.active_rules().await?;
    tracing::debug!("Listing {} active discount rules", rules.len());
    Ok(Json(rules))
}

/// Handler for POST /api/pricing/cache/invalidate
/// Drops the cached rule list so rule edits take effect immediately
#[utoipa::path(
    post,
    path = "/api/pricing/cache/invalidate",
    responses(
        (status = 200, description = "Cache invalidated", body = CacheInvalidationResponse)
    ),
    tag = "pricing"
)]
pub async fn invalidate_cache_handler(
    State(state): State<crate::AppState>,
) -> Json<CacheInvalidationResponse> {
    let invalidated = match state.rule_cache {
        Some(ref cache) => {
            cache.invalidate_all().await;
            true
        }
        None => false,
    };

    Json(CacheInvalidationResponse { invalidated })
}

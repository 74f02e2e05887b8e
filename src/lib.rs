// Bookstore checkout pricing service
//
// Library root: module tree, shared application state and the HTTP router.

pub mod config;
pub mod db;
pub mod pricing;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pricing::handlers::{
    CacheInvalidationResponse, CheckoutItemRequest, CheckoutRequest, CheckoutResponse,
    MetricsResponse,
};
use pricing::{
    CachedRuleRepository, DiscountKind, DiscountResult, DiscountRule, MembershipTier,
    PricingFacade, RuleType, StrategyKind,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        pricing::handlers::price_checkout_handler,
        pricing::handlers::list_discounts_handler,
        pricing::handlers::get_metrics_handler,
        pricing::handlers::invalidate_cache_handler,
    ),
    components(
        schemas(
            CheckoutRequest,
            CheckoutItemRequest,
            CheckoutResponse,
            DiscountResult,
            DiscountRule,
            DiscountKind,
            RuleType,
            MembershipTier,
            StrategyKind,
            MetricsResponse,
            CacheInvalidationResponse,
        )
    ),
    tags(
        (name = "pricing", description = "Checkout discount selection endpoints")
    ),
    info(
        title = "Bookstore Pricing API",
        version = "0.1.0",
        description = "Selects the single best discount for a bookstore checkout"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pricing: PricingFacade,
    /// Present when rules are read through the TTL cache
    pub rule_cache: Option<Arc<CachedRuleRepository>>,
}

/// Creates and configures the application router
/// Maps the pricing endpoints to their handlers and adds CORS middleware
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/api/pricing/checkout",
            post(pricing::handlers::price_checkout_handler),
        )
        .route(
            "/api/pricing/discounts",
            get(pricing::handlers::list_discounts_handler),
        )
        .route(
            "/api/pricing/metrics",
            get(pricing::handlers::get_metrics_handler),
        )
        .route(
            "/api/pricing/cache/invalidate",
            post(pricing::handlers::invalidate_cache_handler),
        )
        .layer(cors)
        .with_state(state)
}

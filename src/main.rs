use std::sync::Arc;

use bookstore_pricing::{
    config::PricingConfig,
    create_router, db,
    pricing::{CachedRuleRepository, PerformanceMetrics, PgPricingStore, PricingFacade, RuleRepository},
    AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Bookstore Pricing API - Starting...");

    let config = PricingConfig::load()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.db_acquire_timeout,
    )
    .await?;

    let store = Arc::new(PgPricingStore::new(pool));
    let metrics = PerformanceMetrics::new();

    let rule_cache = if config.cache_enabled() {
        tracing::info!("Caching rule lookups for {:?}", config.rule_cache_ttl);
        Some(Arc::new(CachedRuleRepository::with_metrics(
            store.clone(),
            config.rule_cache_ttl,
            metrics.clone(),
        )))
    } else {
        tracing::info!("Rule cache disabled");
        None
    };

    let rules: Arc<dyn RuleRepository> = match rule_cache {
        Some(ref cache) => cache.clone(),
        None => store.clone(),
    };

    let pricing = PricingFacade::new(rules, store.clone(), store, metrics);
    let app = create_router(AppState { pricing, rule_cache });

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Bookstore Pricing API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Coursepay server binary.
//!
//! Loads configuration, connects to PostgreSQL, wires the adapters into the
//! application state, and serves the payment API.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use coursepay::adapters::gateway::{HttpGatewayClient, HttpGatewayConfig};
use coursepay::adapters::http::{payment_router, PaymentAppState};
use coursepay::adapters::postgres::{
    PostgresCatalogReader, PostgresInvoiceLedger, PostgresPaymentRepository,
    PostgresSubscriptionRepository,
};
use coursepay::config::AppConfig;
use coursepay::domain::commerce::WebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration first; nothing else can start without it
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        "Starting coursepay"
    );

    // 2. Database pool
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    tracing::info!("PostgreSQL connection pool established");

    // 3. Adapters
    let ledger = Arc::new(PostgresInvoiceLedger::new(pool.clone()));
    let payments = Arc::new(PostgresPaymentRepository::new(pool.clone()));
    let subscriptions = Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let catalog = Arc::new(PostgresCatalogReader::new(pool));
    let gateway = Arc::new(HttpGatewayClient::new(HttpGatewayConfig::from(
        &config.gateway,
    )));
    let webhook_verifier = Arc::new(WebhookVerifier::new(
        SecretString::new(config.gateway.api_secret.clone()),
        config.gateway.allow_unverified_webhooks,
    ));

    let state = PaymentAppState {
        catalog,
        subscriptions,
        ledger,
        payments,
        gateway,
        webhook_verifier,
        default_currency: config.gateway.default_currency.clone(),
    };

    // 4. Router
    let cors = if config.is_production() {
        let origins = config
            .server
            .cors_origins_list()
            .into_iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    } else {
        CorsLayer::permissive()
    };

    let app = axum::Router::new()
        .nest("/api", payment_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // 5. Serve
    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

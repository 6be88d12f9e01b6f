//! ParkPay server binary.
//!
//! Loads configuration from the environment, connects to Postgres, wires the
//! payment gateway and notification adapters, and serves the REST API.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use parkpay::adapters::gateway::GatewayFactory;
use parkpay::adapters::http::{payment_routes, PaymentsAppState};
use parkpay::adapters::notify::{ResendNotifier, TracingNotifier};
use parkpay::adapters::postgres::{PostgresBookingStore, PostgresPaymentStore};
use parkpay::config::AppConfig;
use parkpay::ports::PaymentNotifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.log_level))
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let bookings = Arc::new(PostgresBookingStore::new(pool.clone()));
    let store = Arc::new(PostgresPaymentStore::new(pool));

    let factory = GatewayFactory::new(config.payment.clone(), store.clone());
    let gateway = factory.gateway();
    tracing::info!(provider = %gateway.provider(), "payment gateway ready");

    let notifier: Arc<dyn PaymentNotifier> =
        if config.email.is_enabled() && config.features.send_payment_emails {
            Arc::new(ResendNotifier::new(&config.email))
        } else {
            tracing::info!("payment emails disabled, logging notifications only");
            Arc::new(TracingNotifier::new())
        };

    let state = PaymentsAppState {
        bookings,
        store,
        gateway,
        notifier,
        features: config.features.clone(),
    };

    let cors = match config.server.cors_origins_list() {
        origins if origins.is_empty() => CorsLayer::new().allow_origin(Any),
        origins => {
            let parsed = origins
                .iter()
                .map(|o| o.parse::<axum::http::HeaderValue>())
                .collect::<Result<Vec<_>, _>>()?;
            CorsLayer::new().allow_origin(parsed)
        }
    };

    let app = Router::new()
        .nest("/api/payments", payment_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, environment = ?config.server.environment, "starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Donation Gateway HTTP Server
//!
//! Axum-based server exposing the donation subscription endpoint. CORS is
//! scoped to the configured deploying origin; everything behind the route
//! is the orchestrator in `donation-payments`.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donation_payments::{StripeProcessor, SubscriptionOrchestrator};

use crate::config::GatewayConfig;
use crate::handlers::{create_subscription, health_check, method_not_allowed};
use crate::state::AppState;

fn app(state: AppState, allowed_origin: &str) -> anyhow::Result<Router> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid ALLOWED_ORIGIN: {allowed_origin}"))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/api/subscriptions", post(create_subscription))
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = GatewayConfig::from_env();

    let processor =
        Arc::new(StripeProcessor::from_env().context("Stripe credentials are required")?);
    tracing::info!("✓ Stripe configured");

    let orchestrator = Arc::new(SubscriptionOrchestrator::with_policy(
        processor,
        config.compensation,
    ));
    tracing::info!(
        policy = ?config.compensation,
        currency = %config.defaults.currency,
        country = %config.defaults.country,
        "Donation defaults loaded"
    );

    let state = AppState {
        orchestrator,
        defaults: config.defaults.clone(),
    };

    let app = app(state, &config.allowed_origin)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("🚀 donation gateway running on http://{}", config.bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  POST /api/subscriptions  - Create donation subscription");

    axum::serve(listener, app).await?;

    Ok(())
}

//! Payout Gateway web server.
//!
//! Serves the Stripe webhook, Stripe Connect onboarding, PayPal details and
//! default payout method endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use payout_gateway::{router, AppState, Config, InMemoryStore, JwtAuthenticator, StripeClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("payout_gateway_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        public_base_url = ?config.public_base_url,
        stripe_api_base = %config.stripe_api_base,
        stripe_api_key_configured = config.stripe_api_key.is_some(),
        webhook_secrets_configured = config.webhook_secrets().len(),
        auth_configured = config.auth_jwt_secret.is_some(),
        "config_loaded"
    );

    if config.webhook_secrets().is_empty() {
        warn!("stripe_webhook_secret_missing_all_webhooks_will_be_rejected");
    }

    let stripe = StripeClient::new(
        config.stripe_api_base.clone(),
        config.stripe_api_key.clone(),
        config.request_timeout(),
    );
    let authenticator = JwtAuthenticator::new(
        config.auth_jwt_secret.as_deref(),
        config.auth_jwt_issuer.as_deref(),
        config.auth_jwt_audience.as_deref(),
    );
    let store = InMemoryStore::new();

    let port = config.port;
    let state = AppState::new(
        config,
        Arc::new(stripe),
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(authenticator),
    );

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("payout_gateway_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}

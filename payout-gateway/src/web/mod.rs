//! HTTP surface of the gateway.
//!
//! - `POST /v1/stripe/webhook` is verified by signature, not by user token
//! - `GET /v1/stripe/return/:account_id` is reached through Stripe's redirect
//!   and is unauthenticated
//! - every other `/v1` route requires a bearer token

pub mod handlers;
pub mod return_page;
pub mod signature;


use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    create_connect_account, get_paypal_details, health, onboarding_status,
    payment_method_status, refresh_account_link, save_paypal_details,
    set_default_payment_method, stripe_return, stripe_webhook, AppState, HealthResponse,
    OnboardingResponse, StatusResponse,
};
pub use signature::WebhookVerifier;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/stripe/webhook", post(stripe_webhook))
        .route("/v1/stripe/create-connect-account", post(create_connect_account))
        .route("/v1/stripe/onboarded", get(onboarding_status))
        .route("/v1/stripe/refresh/:account_id", post(refresh_account_link))
        .route("/v1/stripe/return/:account_id", get(stripe_return))
        .route(
            "/v1/paypal/payment-details",
            post(save_paypal_details).get(get_paypal_details),
        )
        .route("/v1/payment-methods/status", get(payment_method_status))
        .route("/v1/payment-methods/default", post(set_default_payment_method))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

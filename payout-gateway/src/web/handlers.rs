//! HTTP endpoint handlers.
//!
//! Handlers only extract request data and delegate to the payment
//! components. Errors render through [`PaymentError`]'s `IntoResponse`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRef, Path, State},
    http::{header::HOST, HeaderMap},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{AuthenticatedUser, Authenticator};
use crate::error::PaymentError;
use crate::payments::{
    AccountLinkInfo, ConnectAccountManager, DefaultMethodSelector, PaymentMethodStatus,
    PaypalRegistry, WebhookDispatcher,
};
use crate::store::{AppPurchases, PaypalDetails, PayoutStore};
use crate::stripe::StripeApi;
use crate::web::return_page::render_return_page;
use crate::web::signature::{WebhookVerifier, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub authenticator: Arc<dyn Authenticator>,
    pub webhooks: Arc<WebhookDispatcher>,
    pub connect: Arc<ConnectAccountManager>,
    pub paypal: Arc<PaypalRegistry>,
    pub methods: Arc<DefaultMethodSelector>,
}

impl AppState {
    /// Wire the payment components to their collaborators.
    pub fn new(
        config: Config,
        stripe: Arc<dyn StripeApi>,
        store: Arc<dyn PayoutStore>,
        purchases: Arc<dyn AppPurchases>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let verifier = WebhookVerifier::new(
            config.webhook_secrets(),
            config.stripe_webhook_tolerance_secs,
        );
        let connect = Arc::new(ConnectAccountManager::new(stripe, store.clone()));

        Self {
            webhooks: Arc::new(WebhookDispatcher::new(verifier, store.clone(), purchases)),
            paypal: Arc::new(PaypalRegistry::new(store.clone())),
            methods: Arc::new(DefaultMethodSelector::new(connect.clone(), store)),
            connect,
            authenticator,
            config: Arc::new(config),
        }
    }

    /// Base URL Stripe should redirect back to.
    ///
    /// The configured public URL wins; otherwise it is rebuilt from the
    /// request's `Host` and `X-Forwarded-Proto` headers.
    fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.config.public_base_url {
            return base.clone();
        }

        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| format!("localhost:{}", self.config.port));
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");

        format!("{}://{}", scheme, host)
    }
}

impl FromRef<AppState> for Arc<dyn Authenticator> {
    fn from_ref(state: &AppState) -> Self {
        state.authenticator.clone()
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Fixed acknowledgement.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn success() -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardingResponse {
    pub onboarding_complete: bool,
}

/// Body of `POST /v1/paypal/payment-details`.
#[derive(Debug, Deserialize)]
pub struct PaypalDetailsRequest {
    pub email: String,
    #[serde(default)]
    pub paypalme_url: Option<String>,
}

/// Body of `POST /v1/payment-methods/default`.
#[derive(Debug, Deserialize)]
pub struct SetDefaultRequest {
    #[serde(default)]
    pub method: Option<String>,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Stripe
// =============================================================================

/// Stripe webhook endpoint.
///
/// Unauthenticated; trust comes from the `Stripe-Signature` header.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusResponse>, PaymentError> {
    info!(body_length = body.len(), "stripe_webhook_received");

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.webhooks.handle(&body, signature).await?;
    info!(outcome = ?outcome, "stripe_webhook_processed");

    Ok(StatusResponse::success())
}

pub async fn create_connect_account(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
    headers: HeaderMap,
) -> Result<Json<AccountLinkInfo>, PaymentError> {
    let base_url = state.base_url(&headers);
    let info = state.connect.create_or_refresh(&uid, &base_url).await?;
    Ok(Json(info))
}

pub async fn onboarding_status(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
) -> Result<Json<OnboardingResponse>, PaymentError> {
    let onboarding_complete = state.connect.onboarding_complete(&uid).await?;
    Ok(Json(OnboardingResponse {
        onboarding_complete,
    }))
}

/// Fresh onboarding link after the previous one expired.
///
/// `account_id` is not checked against the caller's stored account.
pub async fn refresh_account_link(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
    Path(account_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AccountLinkInfo>, PaymentError> {
    info!(uid = %uid, account_id = %account_id, "connect_link_refresh_requested");
    let base_url = state.base_url(&headers);
    let info = state.connect.refresh_link(&account_id, &base_url).await?;
    Ok(Json(info))
}

/// Landing page after Stripe's onboarding redirect. Unauthenticated.
pub async fn stripe_return(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Html<String> {
    let complete = state.connect.return_page_complete(&account_id).await;
    info!(onboarding_complete = complete, "connect_return_page");
    Html(render_return_page(complete))
}

// =============================================================================
// PayPal
// =============================================================================

pub async fn save_paypal_details(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
    Json(body): Json<PaypalDetailsRequest>,
) -> Result<Json<StatusResponse>, PaymentError> {
    let details = PaypalDetails {
        email: body.email,
        paypalme_url: body.paypalme_url,
    };
    state.paypal.save(&uid, details).await?;
    Ok(StatusResponse::success())
}

pub async fn get_paypal_details(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
) -> Result<Json<Option<PaypalDetails>>, PaymentError> {
    Ok(Json(state.paypal.get(&uid).await?))
}

// =============================================================================
// Payment methods
// =============================================================================

pub async fn payment_method_status(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
) -> Result<Json<PaymentMethodStatus>, PaymentError> {
    Ok(Json(state.methods.status(&uid).await?))
}

pub async fn set_default_payment_method(
    State(state): State<AppState>,
    AuthenticatedUser(uid): AuthenticatedUser,
    Json(body): Json<SetDefaultRequest>,
) -> Result<Json<StatusResponse>, PaymentError> {
    let method = body.method.unwrap_or_default();
    state.methods.set_default(&uid, &method).await?;
    Ok(StatusResponse::success())
}

//! Stripe Connect API surface used by the gateway.
//!
//! ## Modules
//!
//! - `client`: reqwest-backed [`StripeClient`]
//! - `event`: typed webhook events

pub mod client;
pub mod event;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use client::StripeClient;
pub use event::{CheckoutSession, StripeEvent, Transfer};

/// Errors from the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// Stripe answered with an error object.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// The request never produced a response.
    #[error("request to Stripe failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body was not what Stripe documents.
    #[error("unexpected Stripe response: {0}")]
    Decode(String),
    #[error("Stripe API key is not configured")]
    MissingApiKey,
    #[error("invalid account id '{0}'")]
    InvalidAccountId(String),
}

/// A hosted onboarding link for a connected account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountLink {
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Connected account as returned by `GET /v1/accounts/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ConnectedAccount {
    /// Onboarding is complete once charges are enabled and details are in.
    pub fn is_onboarded(&self) -> bool {
        self.charges_enabled && self.details_submitted
    }
}

/// Stripe operations behind a trait so tests can swap in a double.
#[async_trait]
pub trait StripeApi: Send + Sync {
    /// Create an Express-dashboard connected account owned by `uid`.
    ///
    /// Returns the new account id.
    async fn create_connect_account(&self, uid: &str) -> Result<String, StripeError>;

    /// Create an `account_onboarding` link for `account_id`.
    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, StripeError>;

    async fn retrieve_account(&self, account_id: &str) -> Result<ConnectedAccount, StripeError>;
}

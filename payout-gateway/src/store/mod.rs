//! User payout profile storage.
//!
//! The service only needs per-user get/set access to three independent
//! fields, so any key-value or document store can back these traits.
//! Nothing here is transactional: a read followed by a conditional write
//! may race with another request for the same user.

pub mod memory;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write {field} for user {uid}: {reason}")]
    Write {
        field: &'static str,
        uid: String,
        reason: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Payout method a user can receive money through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Stripe,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown payment method name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment method '{0}'")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(PaymentMethod::Stripe),
            "paypal" => Ok(PaymentMethod::Paypal),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// PayPal payout details as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalDetails {
    pub email: String,
    #[serde(default)]
    pub paypalme_url: Option<String>,
}

/// Everything this service persists about a single user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayoutProfile {
    pub stripe_connect_account_id: Option<String>,
    pub paypal_details: Option<PaypalDetails>,
    pub default_payment_method: Option<PaymentMethod>,
}

/// Per-user payout profile fields.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn stripe_connect_account_id(&self, uid: &str) -> StoreResult<Option<String>>;

    async fn set_stripe_connect_account_id(&self, uid: &str, account_id: &str) -> StoreResult<()>;

    async fn paypal_details(&self, uid: &str) -> StoreResult<Option<PaypalDetails>>;

    async fn set_paypal_details(&self, uid: &str, details: &PaypalDetails) -> StoreResult<()>;

    async fn default_payment_method(&self, uid: &str) -> StoreResult<Option<PaymentMethod>>;

    async fn set_default_payment_method(&self, uid: &str, method: PaymentMethod)
        -> StoreResult<()>;
}

/// Records completed marketplace purchases.
#[async_trait]
pub trait AppPurchases: Send + Sync {
    /// Grant `uid` access to the paid app `app_id`.
    async fn mark_app_paid(&self, app_id: &str, uid: &str) -> StoreResult<()>;
}

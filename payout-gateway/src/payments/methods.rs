//! Default payout method selection.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::connect::{ConnectAccountManager, StripeStatus};
use crate::error::PaymentError;
use crate::store::{PaymentMethod, PayoutStore, StoreResult};

/// Whether PayPal details are on file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaypalStatus {
    Connected,
    NotConnected,
}

/// Combined status returned by `GET /v1/payment-methods/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodStatus {
    pub stripe: StripeStatus,
    pub paypal: PaypalStatus,
    pub default: Option<PaymentMethod>,
}

/// Set `method` as the default for `uid` unless a default already exists.
///
/// Returns `true` when the default was written. The read and the write are
/// separate store calls, so two concurrent callers may both write.
pub async fn set_default_if_unset(
    store: &dyn PayoutStore,
    uid: &str,
    method: PaymentMethod,
) -> StoreResult<bool> {
    if let Some(existing) = store.default_payment_method(uid).await? {
        info!(uid = %uid, existing = %existing, candidate = %method, "default_method_kept");
        return Ok(false);
    }

    store.set_default_payment_method(uid, method).await?;
    info!(uid = %uid, method = %method, "default_method_auto_selected");
    Ok(true)
}

/// Reports payout method status and applies explicit default choices.
pub struct DefaultMethodSelector {
    connect: Arc<ConnectAccountManager>,
    store: Arc<dyn PayoutStore>,
}

impl DefaultMethodSelector {
    pub fn new(connect: Arc<ConnectAccountManager>, store: Arc<dyn PayoutStore>) -> Self {
        Self { connect, store }
    }

    pub async fn status(&self, uid: &str) -> Result<PaymentMethodStatus, PaymentError> {
        let default = self.store.default_payment_method(uid).await?;
        let stripe = self.connect.onboarding_status(uid).await?;
        let paypal = match self.store.paypal_details(uid).await? {
            Some(_) => PaypalStatus::Connected,
            None => PaypalStatus::NotConnected,
        };

        Ok(PaymentMethodStatus {
            stripe,
            paypal,
            default,
        })
    }

    /// Overwrite the default unconditionally.
    ///
    /// This is the only path that replaces an existing default.
    pub async fn set_default(&self, uid: &str, method: &str) -> Result<PaymentMethod, PaymentError> {
        let method: PaymentMethod = method
            .parse()
            .map_err(|_| PaymentError::InvalidMethod(method.to_string()))?;

        self.store.set_default_payment_method(uid, method).await?;
        info!(uid = %uid, method = %method, "default_method_set");
        Ok(method)
    }
}

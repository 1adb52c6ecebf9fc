//! PayPal payout details.
//!
//! The paypal.me link is stored with an `https://` scheme and returned
//! without one, so clients always display the bare form.

use std::sync::Arc;

use tracing::info;

use super::methods::set_default_if_unset;
use crate::error::PaymentError;
use crate::store::{PaymentMethod, PaypalDetails, PayoutStore};

const SECURE_SCHEME: &str = "https://";
const INSECURE_SCHEME: &str = "http://";

pub struct PaypalRegistry {
    store: Arc<dyn PayoutStore>,
}

impl PaypalRegistry {
    pub fn new(store: Arc<dyn PayoutStore>) -> Self {
        Self { store }
    }

    /// Store `details` for `uid` and make PayPal the default if none is set.
    ///
    /// Storage failures surface as [`PaymentError::ValidationError`].
    pub async fn save(&self, uid: &str, details: PaypalDetails) -> Result<(), PaymentError> {
        let email = details.email.trim();
        if email.is_empty() {
            return Err(PaymentError::ValidationError("email is required".to_string()));
        }

        let stored = PaypalDetails {
            email: email.to_string(),
            paypalme_url: details
                .paypalme_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(with_scheme),
        };

        self.store
            .set_paypal_details(uid, &stored)
            .await
            .map_err(|e| PaymentError::ValidationError(e.to_string()))?;

        info!(uid = %uid, has_paypalme_url = stored.paypalme_url.is_some(), "paypal_details_saved");

        set_default_if_unset(self.store.as_ref(), uid, PaymentMethod::Paypal)
            .await
            .map_err(|e| PaymentError::ValidationError(e.to_string()))?;

        Ok(())
    }

    /// Details for `uid` in display form.
    pub async fn get(&self, uid: &str) -> Result<Option<PaypalDetails>, PaymentError> {
        let details = self.store.paypal_details(uid).await?;

        Ok(details.map(|d| PaypalDetails {
            email: d.email,
            paypalme_url: d.paypalme_url.as_deref().map(|url| without_scheme(url).to_string()),
        }))
    }
}

fn with_scheme(url: &str) -> String {
    if url.starts_with(SECURE_SCHEME) || url.starts_with(INSECURE_SCHEME) {
        url.to_string()
    } else {
        format!("{}{}", SECURE_SCHEME, url)
    }
}

fn without_scheme(url: &str) -> &str {
    url.strip_prefix(SECURE_SCHEME)
        .or_else(|| url.strip_prefix(INSECURE_SCHEME))
        .unwrap_or(url)
}

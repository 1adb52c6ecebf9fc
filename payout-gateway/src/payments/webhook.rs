//! Stripe webhook dispatch.
//!
//! Deliveries are verified, parsed into a [`StripeEvent`] and routed to a
//! side effect. There is no idempotency tracking: a redelivered event runs
//! its side effect again.

use std::sync::Arc;

use tracing::{info, warn};

use super::methods::set_default_if_unset;
use crate::error::PaymentError;
use crate::store::{AppPurchases, PaymentMethod, PayoutStore};
use crate::stripe::{CheckoutSession, ConnectedAccount, StripeEvent, Transfer};
use crate::web::signature::WebhookVerifier;

/// Length of the prefix the checkout creator puts before the user id in
/// `client_reference_id`.
const CLIENT_REFERENCE_PREFIX_LEN: usize = 4;

/// What a delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    AppPaid { app_id: String, uid: String },
    DefaultMethodSet { uid: String },
    DefaultMethodKept { uid: String },
    /// Recognised or not, nothing needed doing.
    Ignored,
}

pub struct WebhookDispatcher {
    verifier: WebhookVerifier,
    store: Arc<dyn PayoutStore>,
    purchases: Arc<dyn AppPurchases>,
}

impl WebhookDispatcher {
    pub fn new(
        verifier: WebhookVerifier,
        store: Arc<dyn PayoutStore>,
        purchases: Arc<dyn AppPurchases>,
    ) -> Self {
        Self {
            verifier,
            store,
            purchases,
        }
    }

    /// Verify, parse and dispatch a raw delivery.
    ///
    /// The signature is checked before the body is parsed.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentError> {
        let Some(signature) = signature else {
            warn!("stripe_webhook_signature_missing");
            return Err(PaymentError::InvalidSignature);
        };

        if !self.verifier.verify(payload, signature) {
            return Err(PaymentError::InvalidSignature);
        }

        let (event_id, event) = StripeEvent::from_payload(payload)
            .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;

        info!(
            event_id = event_id.as_deref().unwrap_or("unknown"),
            event_type = event.event_type(),
            "stripe_webhook_event"
        );

        self.dispatch(event).await
    }

    pub async fn dispatch(&self, event: StripeEvent) -> Result<WebhookOutcome, PaymentError> {
        match event {
            StripeEvent::CheckoutSessionCompleted(session) => self.checkout_completed(session).await,
            StripeEvent::AccountUpdated(account) => self.account_updated(account).await,
            StripeEvent::TransferCreated(transfer) => {
                Self::transfer_created(&transfer);
                Ok(WebhookOutcome::Ignored)
            }
            StripeEvent::Unhandled(event_type) => {
                info!(event_type = %event_type, "stripe_webhook_unhandled");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn checkout_completed(
        &self,
        session: CheckoutSession,
    ) -> Result<WebhookOutcome, PaymentError> {
        info!(session_id = %session.id, "stripe_checkout_completed");

        let app_id = session.metadata.get("app_id").cloned().ok_or_else(|| {
            PaymentError::InvalidPayload("checkout session has no app_id metadata".to_string())
        })?;
        let uid = user_id_from_reference(session.client_reference_id.as_deref())?;

        self.purchases.mark_app_paid(&app_id, &uid).await?;
        info!(app_id = %app_id, uid = %uid, "app_marked_paid");

        Ok(WebhookOutcome::AppPaid { app_id, uid })
    }

    async fn account_updated(
        &self,
        account: ConnectedAccount,
    ) -> Result<WebhookOutcome, PaymentError> {
        if !account.is_onboarded() {
            info!(
                account_id = %account.id,
                charges_enabled = account.charges_enabled,
                details_submitted = account.details_submitted,
                "stripe_account_not_onboarded"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let Some(uid) = account.metadata.get("uid") else {
            warn!(account_id = %account.id, "stripe_account_missing_uid");
            return Ok(WebhookOutcome::Ignored);
        };

        if set_default_if_unset(self.store.as_ref(), uid, PaymentMethod::Stripe).await? {
            Ok(WebhookOutcome::DefaultMethodSet { uid: uid.clone() })
        } else {
            Ok(WebhookOutcome::DefaultMethodKept { uid: uid.clone() })
        }
    }

    // TODO: link transfers to the payout records they settle once those exist.
    fn transfer_created(transfer: &Transfer) {
        info!(
            transfer_id = %transfer.id,
            destination = transfer.destination.as_deref().unwrap_or(""),
            amount = transfer.amount,
            currency = transfer.currency.as_deref().unwrap_or(""),
            "stripe_transfer_created"
        );
    }
}

/// Strip the fixed-width prefix from a checkout `client_reference_id`.
///
/// References shorter than the prefix, or missing, are rejected.
pub fn user_id_from_reference(reference: Option<&str>) -> Result<String, PaymentError> {
    let reference = reference.ok_or(PaymentError::InvalidClientReference)?;

    if reference.chars().count() < CLIENT_REFERENCE_PREFIX_LEN {
        return Err(PaymentError::InvalidClientReference);
    }

    Ok(reference.chars().skip(CLIENT_REFERENCE_PREFIX_LEN).collect())
}

//! Typed Stripe webhook events.
//!
//! Only the event types the gateway reacts to are modelled. Everything else
//! parses into [`StripeEvent::Unhandled`] so new Stripe event types never
//! fail a delivery.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::ConnectedAccount;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const ACCOUNT_UPDATED: &str = "account.updated";
pub const TRANSFER_CREATED: &str = "transfer.created";

/// Why a webhook body could not be turned into a [`StripeEvent`].
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("body is not a Stripe event: {0}")]
    Envelope(serde_json::Error),
    #[error("invalid {event_type} object: {source}")]
    Object {
        event_type: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Deserialize)]
struct EnvelopeData {
    object: Value,
}

/// Checkout session attached to `checkout.session.completed`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Transfer attached to `transfer.created`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transfer {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

/// A verified webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripeEvent {
    CheckoutSessionCompleted(CheckoutSession),
    AccountUpdated(ConnectedAccount),
    TransferCreated(Transfer),
    /// Any event type without a handler, kept by name for logging.
    Unhandled(String),
}

impl StripeEvent {
    /// Parse a raw webhook body.
    ///
    /// Returns the event id (when present) alongside the event.
    pub fn from_payload(payload: &[u8]) -> Result<(Option<String>, Self), EventParseError> {
        let envelope: Envelope =
            serde_json::from_slice(payload).map_err(EventParseError::Envelope)?;
        let object = envelope.data.object;

        let event = match envelope.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                StripeEvent::CheckoutSessionCompleted(object_as(CHECKOUT_SESSION_COMPLETED, object)?)
            }
            ACCOUNT_UPDATED => StripeEvent::AccountUpdated(object_as(ACCOUNT_UPDATED, object)?),
            TRANSFER_CREATED => StripeEvent::TransferCreated(object_as(TRANSFER_CREATED, object)?),
            _ => StripeEvent::Unhandled(envelope.event_type),
        };

        Ok((envelope.id, event))
    }

    /// Stripe's name for this event type.
    pub fn event_type(&self) -> &str {
        match self {
            StripeEvent::CheckoutSessionCompleted(_) => CHECKOUT_SESSION_COMPLETED,
            StripeEvent::AccountUpdated(_) => ACCOUNT_UPDATED,
            StripeEvent::TransferCreated(_) => TRANSFER_CREATED,
            StripeEvent::Unhandled(name) => name,
        }
    }
}

fn object_as<T: DeserializeOwned>(
    event_type: &'static str,
    object: Value,
) -> Result<T, EventParseError> {
    serde_json::from_value(object).map_err(|source| EventParseError::Object { event_type, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<(Option<String>, StripeEvent), EventParseError> {
        StripeEvent::from_payload(&serde_json::to_vec(&value).unwrap())
    }

    #[test]
    fn test_parse_checkout_session_completed() {
        let (id, event) = parse(json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_test_1",
                "client_reference_id": "uid_user-1",
                "metadata": {"app_id": "app-9"}
            }}
        }))
        .unwrap();

        assert_eq!(id.as_deref(), Some("evt_1"));
        match event {
            StripeEvent::CheckoutSessionCompleted(session) => {
                assert_eq!(session.id, "cs_test_1");
                assert_eq!(session.client_reference_id.as_deref(), Some("uid_user-1"));
                assert_eq!(session.metadata.get("app_id").map(String::as_str), Some("app-9"));
            }
            other => panic!("Expected checkout session, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_account_updated() {
        let (_, event) = parse(json!({
            "type": "account.updated",
            "data": {"object": {
                "id": "acct_1",
                "charges_enabled": true,
                "details_submitted": true,
                "metadata": {"uid": "u1"}
            }}
        }))
        .unwrap();

        match event {
            StripeEvent::AccountUpdated(account) => {
                assert!(account.is_onboarded());
                assert_eq!(account.metadata.get("uid").map(String::as_str), Some("u1"));
            }
            other => panic!("Expected account update, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_unhandled() {
        let (_, event) = parse(json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": {"object": {"whatever": 1}}
        }))
        .unwrap();

        assert_eq!(event, StripeEvent::Unhandled("invoice.paid".to_string()));
        assert_eq!(event.event_type(), "invoice.paid");
    }

    #[test]
    fn test_reject_non_event_body() {
        assert!(matches!(
            StripeEvent::from_payload(b"not json"),
            Err(EventParseError::Envelope(_))
        ));
        assert!(matches!(
            parse(json!({"type": "account.updated"})),
            Err(EventParseError::Envelope(_))
        ));
    }

    #[test]
    fn test_reject_malformed_known_object() {
        let err = parse(json!({
            "type": "transfer.created",
            "data": {"object": {"amount": 100}}
        }))
        .unwrap_err();

        assert!(matches!(
            err,
            EventParseError::Object {
                event_type: TRANSFER_CREATED,
                ..
            }
        ));
    }
}

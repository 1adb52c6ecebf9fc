//! Payout account management and Stripe event handling.
//!
//! ## Components
//!
//! ```text
//! Stripe ──webhook──▶ WebhookDispatcher ──▶ AppPurchases / PayoutStore
//! User ──▶ ConnectAccountManager ──▶ StripeApi + PayoutStore
//! User ──▶ PaypalRegistry ──▶ PayoutStore
//! User ──▶ DefaultMethodSelector ──▶ ConnectAccountManager + PayoutStore
//! ```
//!
//! Both automatic default selections (completed Stripe onboarding, first
//! PayPal details) only write when the user has no default yet.

pub mod connect;
pub mod methods;
pub mod paypal;
pub mod webhook;

pub use connect::{AccountLinkInfo, ConnectAccountManager, StripeStatus};
pub use methods::{
    set_default_if_unset, DefaultMethodSelector, PaymentMethodStatus, PaypalStatus,
};
pub use paypal::PaypalRegistry;
pub use webhook::{user_id_from_reference, WebhookDispatcher, WebhookOutcome};

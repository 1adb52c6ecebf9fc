//! Payout Gateway - Stripe Connect and PayPal payout management.
//!
//! This library backs the `payout-gateway` web server:
//! - Receives Stripe webhooks and applies their side effects
//! - Onboards users onto Stripe Connect
//! - Stores PayPal payout details
//! - Tracks each user's default payout method
//!
//! ## Architecture
//!
//! ```text
//! Stripe webhook ─┐
//!                 ├→ web (axum) → payments → stripe (API) / store
//! User request ───┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod payments;
pub mod store;
pub mod stripe;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use auth::{AuthenticatedUser, Authenticator, JwtAuthenticator};
pub use config::Config;
pub use error::PaymentError;
pub use payments::{
    ConnectAccountManager, DefaultMethodSelector, PaypalRegistry, WebhookDispatcher,
};
pub use store::{AppPurchases, InMemoryStore, PaymentMethod, PaypalDetails, PayoutStore};
pub use stripe::{StripeApi, StripeClient};
pub use web::{router, AppState};

//! Stripe Connect onboarding.
//!
//! A user gets at most one connected account. Onboarding links expire, so
//! every request for a link produces a fresh one for the stored account.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use urlencoding::encode;

use crate::error::PaymentError;
use crate::store::PayoutStore;
use crate::stripe::StripeApi;

/// Onboarding link handed back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLinkInfo {
    pub account_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Stripe onboarding state, derived on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StripeStatus {
    NotConnected,
    Incomplete,
    Connected,
}

pub struct ConnectAccountManager {
    stripe: Arc<dyn StripeApi>,
    store: Arc<dyn PayoutStore>,
}

impl ConnectAccountManager {
    pub fn new(stripe: Arc<dyn StripeApi>, store: Arc<dyn PayoutStore>) -> Self {
        Self { stripe, store }
    }

    /// Create the user's connected account if needed and return a fresh
    /// onboarding link.
    ///
    /// The account id is persisted before the link is requested, so a failed
    /// link request never leaves an orphaned Stripe account.
    pub async fn create_or_refresh(
        &self,
        uid: &str,
        base_url: &str,
    ) -> Result<AccountLinkInfo, PaymentError> {
        let account_id = match self.store.stripe_connect_account_id(uid).await? {
            Some(existing) => {
                info!(uid = %uid, account_id = %existing, "connect_account_exists");
                existing
            }
            None => {
                let created = self.stripe.create_connect_account(uid).await?;
                self.store
                    .set_stripe_connect_account_id(uid, &created)
                    .await?;
                info!(uid = %uid, account_id = %created, "connect_account_created");
                created
            }
        };

        self.refresh_link(&account_id, base_url).await
    }

    /// Generate a new onboarding link for `account_id`.
    ///
    /// The caller is responsible for deciding whether the requester may act
    /// on this account.
    pub async fn refresh_link(
        &self,
        account_id: &str,
        base_url: &str,
    ) -> Result<AccountLinkInfo, PaymentError> {
        let base_url = base_url.trim_end_matches('/');
        let segment = encode(account_id);
        let refresh_url = format!("{}/v1/stripe/refresh/{}", base_url, segment);
        let return_url = format!("{}/v1/stripe/return/{}", base_url, segment);

        let link = self
            .stripe
            .create_account_link(account_id, &refresh_url, &return_url)
            .await?;

        info!(account_id = %account_id, expires_at = ?link.expires_at, "connect_link_created");

        Ok(AccountLinkInfo {
            account_id: account_id.to_string(),
            url: link.url,
            expires_at: link.expires_at,
        })
    }

    pub async fn onboarding_status(&self, uid: &str) -> Result<StripeStatus, PaymentError> {
        let Some(account_id) = self.store.stripe_connect_account_id(uid).await? else {
            return Ok(StripeStatus::NotConnected);
        };

        if self.is_account_onboarded(&account_id).await? {
            Ok(StripeStatus::Connected)
        } else {
            Ok(StripeStatus::Incomplete)
        }
    }

    /// `false` for users who never created an account.
    pub async fn onboarding_complete(&self, uid: &str) -> Result<bool, PaymentError> {
        Ok(self.onboarding_status(uid).await? == StripeStatus::Connected)
    }

    pub async fn is_account_onboarded(&self, account_id: &str) -> Result<bool, PaymentError> {
        let account = self.stripe.retrieve_account(account_id).await?;
        Ok(account.is_onboarded())
    }

    /// Completion flag for the unauthenticated return page.
    ///
    /// Any Stripe failure reads as incomplete.
    pub async fn return_page_complete(&self, account_id: &str) -> bool {
        match self.is_account_onboarded(account_id).await {
            Ok(complete) => complete,
            Err(e) => {
                warn!(error = %e, "connect_return_status_failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::testing::FakeStripe;

    const BASE: &str = "https://pay.example.com";

    fn manager(store: &InMemoryStore, stripe: &FakeStripe) -> ConnectAccountManager {
        ConnectAccountManager::new(Arc::new(stripe.clone()), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_create_account_for_new_user() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        let manager = manager(&store, &stripe);

        let info = manager.create_or_refresh("u1", BASE).await.unwrap();

        assert_eq!(stripe.accounts_created(), 1);
        assert_eq!(
            store.stripe_connect_account_id("u1").await.unwrap(),
            Some(info.account_id.clone())
        );
        assert_eq!(stripe.account_owner(&info.account_id).as_deref(), Some("u1"));

        let (_, refresh_url, return_url) = stripe.last_link().unwrap();
        assert_eq!(
            refresh_url,
            format!("{}/v1/stripe/refresh/{}", BASE, info.account_id)
        );
        assert_eq!(
            return_url,
            format!("{}/v1/stripe/return/{}", BASE, info.account_id)
        );
    }

    #[tokio::test]
    async fn test_redirect_urls_encode_account_id() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        let manager = manager(&store, &stripe);

        let info = manager.refresh_link("acct/../x", BASE).await.unwrap();

        assert_eq!(info.account_id, "acct/../x");
        let (account_id, refresh_url, return_url) = stripe.last_link().unwrap();
        assert_eq!(account_id, "acct/../x");
        assert_eq!(refresh_url, format!("{}/v1/stripe/refresh/acct%2F..%2Fx", BASE));
        assert_eq!(return_url, format!("{}/v1/stripe/return/acct%2F..%2Fx", BASE));
    }

    #[tokio::test]
    async fn test_existing_account_only_gets_new_link() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        let manager = manager(&store, &stripe);

        let first = manager.create_or_refresh("u1", BASE).await.unwrap();
        let second = manager.create_or_refresh("u1", BASE).await.unwrap();

        assert_eq!(stripe.accounts_created(), 1);
        assert_eq!(stripe.links_created(), 2);
        assert_eq!(first.account_id, second.account_id);
        assert_ne!(first.url, second.url);
    }

    #[tokio::test]
    async fn test_processor_failure_is_surfaced() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        stripe.fail_with("Request rate limit exceeded.");
        let manager = manager(&store, &stripe);

        let err = manager.create_or_refresh("u1", BASE).await.unwrap_err();

        assert!(
            matches!(err, PaymentError::ProcessorError(ref m) if m == "Request rate limit exceeded.")
        );
        assert_eq!(store.stripe_connect_account_id("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_onboarding_status_transitions() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        let manager = manager(&store, &stripe);

        assert_eq!(
            manager.onboarding_status("u1").await.unwrap(),
            StripeStatus::NotConnected
        );
        assert!(!manager.onboarding_complete("u1").await.unwrap());

        let info = manager.create_or_refresh("u1", BASE).await.unwrap();
        assert_eq!(
            manager.onboarding_status("u1").await.unwrap(),
            StripeStatus::Incomplete
        );
        // Repeated queries without a state change agree.
        assert_eq!(
            manager.onboarding_status("u1").await.unwrap(),
            StripeStatus::Incomplete
        );

        stripe.complete_onboarding(&info.account_id);
        assert_eq!(
            manager.onboarding_status("u1").await.unwrap(),
            StripeStatus::Connected
        );
        assert!(manager.onboarding_complete("u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_never_created_user_skips_stripe() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        stripe.fail_with("should not be called");
        let manager = manager(&store, &stripe);

        assert!(!manager.onboarding_complete("u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_link_trims_base_url() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        let account_id = stripe.add_account("u1", false);
        let manager = manager(&store, &stripe);

        let info = manager
            .refresh_link(&account_id, "http://localhost:8080/")
            .await
            .unwrap();

        assert_eq!(info.account_id, account_id);
        let (_, refresh_url, _) = stripe.last_link().unwrap();
        assert_eq!(
            refresh_url,
            format!("http://localhost:8080/v1/stripe/refresh/{}", account_id)
        );
    }

    #[tokio::test]
    async fn test_return_page_complete_hides_errors() {
        let store = InMemoryStore::new();
        let stripe = FakeStripe::new();
        let account_id = stripe.add_account("u1", true);
        let manager = manager(&store, &stripe);

        assert!(manager.return_page_complete(&account_id).await);
        assert!(!manager.return_page_complete("acct_unknown").await);

        stripe.fail_with("boom");
        assert!(!manager.return_page_complete(&account_id).await);
    }
}

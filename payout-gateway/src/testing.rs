//! Test doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::store::{
    AppPurchases, PaymentMethod, PaypalDetails, PayoutStore, StoreError, StoreResult,
};
use crate::stripe::{AccountLink, ConnectedAccount, StripeApi, StripeError};

/// In-memory stand-in for the Stripe API.
#[derive(Clone, Default)]
pub struct FakeStripe {
    inner: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, ConnectedAccount>,
    next_id: u32,
    accounts_created: usize,
    links: Vec<(String, String, String)>,
    failure: Option<String>,
}

impl FakeStripe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        self.inner.lock().unwrap().failure = Some(message.to_string());
    }

    /// Register an account owned by `uid` directly, bypassing creation.
    pub fn add_account(&self, uid: &str, onboarded: bool) -> String {
        let mut state = self.inner.lock().unwrap();
        state.next_id += 1;
        let id = format!("acct_test_{}", state.next_id);
        state.accounts.insert(
            id.clone(),
            ConnectedAccount {
                id: id.clone(),
                charges_enabled: onboarded,
                details_submitted: onboarded,
                metadata: HashMap::from([("uid".to_string(), uid.to_string())]),
            },
        );
        id
    }

    pub fn complete_onboarding(&self, account_id: &str) {
        let mut state = self.inner.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(account_id) {
            account.charges_enabled = true;
            account.details_submitted = true;
        }
    }

    pub fn account_owner(&self, account_id: &str) -> Option<String> {
        let state = self.inner.lock().unwrap();
        state
            .accounts
            .get(account_id)
            .and_then(|a| a.metadata.get("uid").cloned())
    }

    pub fn accounts_created(&self) -> usize {
        self.inner.lock().unwrap().accounts_created
    }

    pub fn links_created(&self) -> usize {
        self.inner.lock().unwrap().links.len()
    }

    /// `(account_id, refresh_url, return_url)` of the latest link.
    pub fn last_link(&self) -> Option<(String, String, String)> {
        self.inner.lock().unwrap().links.last().cloned()
    }

    fn check_failure(&self) -> Result<(), StripeError> {
        match &self.inner.lock().unwrap().failure {
            Some(message) => Err(StripeError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StripeApi for FakeStripe {
    async fn create_connect_account(&self, uid: &str) -> Result<String, StripeError> {
        self.check_failure()?;
        let id = self.add_account(uid, false);
        self.inner.lock().unwrap().accounts_created += 1;
        Ok(id)
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, StripeError> {
        self.check_failure()?;
        let mut state = self.inner.lock().unwrap();
        state.links.push((
            account_id.to_string(),
            refresh_url.to_string(),
            return_url.to_string(),
        ));
        Ok(AccountLink {
            url: format!(
                "https://connect.stripe.test/setup/{}/{}",
                account_id,
                state.links.len()
            ),
            expires_at: Some(1_700_000_300),
        })
    }

    async fn retrieve_account(&self, account_id: &str) -> Result<ConnectedAccount, StripeError> {
        self.check_failure()?;
        self.inner
            .lock()
            .unwrap()
            .accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| StripeError::Api {
                status: 404,
                message: format!("No such account: '{}'", account_id),
            })
    }
}

/// Store whose backend is down: reads report `Unavailable`, writes `Write`.
#[derive(Clone, Copy, Default)]
pub struct FailingStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

fn write_failed(field: &'static str, uid: &str) -> StoreResult<()> {
    Err(StoreError::Write {
        field,
        uid: uid.to_string(),
        reason: "connection refused".to_string(),
    })
}

#[async_trait]
impl PayoutStore for FailingStore {
    async fn stripe_connect_account_id(&self, _uid: &str) -> StoreResult<Option<String>> {
        unavailable()
    }

    async fn set_stripe_connect_account_id(&self, uid: &str, _account_id: &str) -> StoreResult<()> {
        write_failed("stripe_connect_account_id", uid)
    }

    async fn paypal_details(&self, _uid: &str) -> StoreResult<Option<PaypalDetails>> {
        unavailable()
    }

    async fn set_paypal_details(&self, uid: &str, _details: &PaypalDetails) -> StoreResult<()> {
        write_failed("paypal_details", uid)
    }

    async fn default_payment_method(&self, _uid: &str) -> StoreResult<Option<PaymentMethod>> {
        unavailable()
    }

    async fn set_default_payment_method(
        &self,
        uid: &str,
        _method: PaymentMethod,
    ) -> StoreResult<()> {
        write_failed("default_payment_method", uid)
    }
}

#[async_trait]
impl AppPurchases for FailingStore {
    async fn mark_app_paid(&self, _app_id: &str, uid: &str) -> StoreResult<()> {
        write_failed("paid_apps", uid)
    }
}

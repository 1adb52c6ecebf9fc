//! In-process store backed by hash maps.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AppPurchases, PaymentMethod, PaypalDetails, PayoutProfile, PayoutStore, StoreResult};

/// Payout profiles and paid apps held in memory.
///
/// Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    profiles: RwLock<HashMap<String, PayoutProfile>>,
    paid_apps: RwLock<HashSet<(String, String)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored for `uid`.
    pub async fn profile(&self, uid: &str) -> PayoutProfile {
        self.inner
            .profiles
            .read()
            .await
            .get(uid)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `uid` has been granted `app_id`.
    pub async fn is_app_paid(&self, app_id: &str, uid: &str) -> bool {
        self.inner
            .paid_apps
            .read()
            .await
            .contains(&(app_id.to_string(), uid.to_string()))
    }

    async fn update<F>(&self, uid: &str, apply: F)
    where
        F: FnOnce(&mut PayoutProfile),
    {
        let mut profiles = self.inner.profiles.write().await;
        apply(profiles.entry(uid.to_string()).or_default());
    }
}

#[async_trait]
impl PayoutStore for InMemoryStore {
    async fn stripe_connect_account_id(&self, uid: &str) -> StoreResult<Option<String>> {
        Ok(self.profile(uid).await.stripe_connect_account_id)
    }

    async fn set_stripe_connect_account_id(&self, uid: &str, account_id: &str) -> StoreResult<()> {
        debug!(uid = %uid, account_id = %account_id, "store_set_stripe_account");
        self.update(uid, |p| p.stripe_connect_account_id = Some(account_id.to_string()))
            .await;
        Ok(())
    }

    async fn paypal_details(&self, uid: &str) -> StoreResult<Option<PaypalDetails>> {
        Ok(self.profile(uid).await.paypal_details)
    }

    async fn set_paypal_details(&self, uid: &str, details: &PaypalDetails) -> StoreResult<()> {
        debug!(uid = %uid, "store_set_paypal_details");
        self.update(uid, |p| p.paypal_details = Some(details.clone()))
            .await;
        Ok(())
    }

    async fn default_payment_method(&self, uid: &str) -> StoreResult<Option<PaymentMethod>> {
        Ok(self.profile(uid).await.default_payment_method)
    }

    async fn set_default_payment_method(
        &self,
        uid: &str,
        method: PaymentMethod,
    ) -> StoreResult<()> {
        debug!(uid = %uid, method = %method, "store_set_default_method");
        self.update(uid, |p| p.default_payment_method = Some(method))
            .await;
        Ok(())
    }
}

#[async_trait]
impl AppPurchases for InMemoryStore {
    async fn mark_app_paid(&self, app_id: &str, uid: &str) -> StoreResult<()> {
        self.inner
            .paid_apps
            .write()
            .await
            .insert((app_id.to_string(), uid.to_string()));
        Ok(())
    }
}

//! HTTP client for the Stripe REST API.
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token. Failures are returned immediately; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info, warn};
use urlencoding::encode;

use super::{AccountLink, ConnectedAccount, StripeApi, StripeError};

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    api_base: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct CreatedAccount {
    id: String,
}

impl StripeClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into(),
            api_key,
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// `/v1/accounts/{id}` with the id confined to a single path segment.
    fn account_path(account_id: &str) -> Result<String, StripeError> {
        if matches!(account_id, "" | "." | "..") {
            warn!(account_id = %account_id, "stripe_account_id_rejected");
            return Err(StripeError::InvalidAccountId(account_id.to_string()));
        }
        Ok(format!("/v1/accounts/{}", encode(account_id)))
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, StripeError> {
        let key = self.api_key.as_deref().ok_or(StripeError::MissingApiKey)?;
        Ok(request.bearer_auth(key).timeout(self.timeout))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, StripeError> {
        let response = match self.authorize(request)?.send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!(operation, error = %e, is_timeout = e.is_timeout(), "stripe_request_failed");
                return Err(StripeError::Transport(e));
            }
        };

        decode(operation, response).await
    }
}

/// Turn a Stripe response into `T` or the error message Stripe reported.
async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, StripeError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("Stripe returned HTTP {}", status.as_u16()));

        error!(
            operation,
            status_code = status.as_u16(),
            message = %message,
            "stripe_api_error"
        );
        return Err(StripeError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| StripeError::Decode(e.to_string()))
}

#[async_trait]
impl StripeApi for StripeClient {
    async fn create_connect_account(&self, uid: &str) -> Result<String, StripeError> {
        let params = [
            ("controller[stripe_dashboard][type]", "express"),
            ("controller[fees][payer]", "application"),
            ("controller[losses][payments]", "application"),
            ("capabilities[transfers][requested]", "true"),
            ("metadata[uid]", uid),
        ];

        let request = self.http.post(self.url("/v1/accounts")).form(&params);
        let created: CreatedAccount = self.send("create_account", request).await?;

        info!(uid = %uid, account_id = %created.id, "stripe_account_created");
        Ok(created.id)
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, StripeError> {
        let params = [
            ("account", account_id),
            ("refresh_url", refresh_url),
            ("return_url", return_url),
            ("type", "account_onboarding"),
        ];

        let request = self.http.post(self.url("/v1/account_links")).form(&params);
        self.send("create_account_link", request).await
    }

    async fn retrieve_account(&self, account_id: &str) -> Result<ConnectedAccount, StripeError> {
        let path = Self::account_path(account_id)?;
        let request = self.http.get(self.url(&path));
        self.send("retrieve_account", request).await
    }
}

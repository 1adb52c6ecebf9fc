//! Configuration module for environment variable parsing.
//!
//! Every setting has a default or is optional, so a malformed value never
//! prevents startup; it is logged and replaced by its default instead.

use std::env;
use std::time::Duration;

use tracing::warn;
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Externally visible base URL used in onboarding redirect links.
    /// When unset the base URL is derived from the request headers.
    pub public_base_url: Option<String>,

    // =========================================================================
    // Stripe
    // =========================================================================

    /// Stripe secret API key
    pub stripe_api_key: Option<String>,

    /// Stripe API base URL (overridable for tests and proxies)
    pub stripe_api_base: String,

    /// HTTP request timeout in milliseconds for Stripe API calls
    pub request_timeout_ms: u64,

    /// Signing secret of the platform webhook endpoint
    pub stripe_webhook_secret: Option<String>,

    /// Signing secret of the Connect webhook endpoint
    pub stripe_connect_webhook_secret: Option<String>,

    /// Maximum age in seconds of a signed webhook timestamp
    pub stripe_webhook_tolerance_secs: u64,

    // =========================================================================
    // User authentication
    // =========================================================================

    /// HS256 secret used to verify user bearer tokens
    pub auth_jwt_secret: Option<String>,

    /// Expected `iss` claim, if any
    pub auth_jwt_issuer: Option<String>,

    /// Accepted `aud` claims, if any
    pub auth_jwt_audience: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            public_base_url: parse_base_url("PUBLIC_BASE_URL"),

            stripe_api_key: non_empty("STRIPE_API_KEY"),

            stripe_api_base: env::var("STRIPE_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),

            stripe_webhook_secret: non_empty("STRIPE_WEBHOOK_SECRET"),

            stripe_connect_webhook_secret: non_empty("STRIPE_CONNECT_WEBHOOK_SECRET"),

            stripe_webhook_tolerance_secs: env::var("STRIPE_WEBHOOK_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),

            auth_jwt_secret: non_empty("AUTH_JWT_SECRET"),

            auth_jwt_issuer: non_empty("AUTH_JWT_ISSUER"),

            auth_jwt_audience: parse_csv("AUTH_JWT_AUDIENCE"),
        }
    }

    /// All configured webhook signing secrets, platform endpoint first.
    pub fn webhook_secrets(&self) -> Vec<String> {
        [&self.stripe_webhook_secret, &self.stripe_connect_webhook_secret]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an absolute base URL, dropping any trailing slash.
fn parse_base_url(name: &str) -> Option<String> {
    let raw = non_empty(name)?;

    match Url::parse(&raw) {
        Ok(url) if url.has_host() => Some(raw.trim_end_matches('/').to_string()),
        _ => {
            warn!(env_var = name, value = %raw, "Invalid base URL, ignoring");
            None
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

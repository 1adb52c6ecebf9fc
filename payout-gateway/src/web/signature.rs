//! Stripe webhook signature verification.
//!
//! Stripe signs each delivery using HMAC-SHA256 and sends the result in the
//! `Stripe-Signature` header.
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Verifies `Stripe-Signature` headers against one or more signing secrets.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secrets: Vec<String>,
    tolerance_secs: u64,
}

impl WebhookVerifier {
    /// Blank secrets are ignored.
    pub fn new(secrets: Vec<String>, tolerance_secs: u64) -> Self {
        Self {
            secrets: secrets
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect(),
            tolerance_secs,
        }
    }

    /// Whether at least one signing secret is configured.
    pub fn is_enabled(&self) -> bool {
        !self.secrets.is_empty()
    }

    /// Verify a webhook delivery.
    ///
    /// # Arguments
    ///
    /// * `payload` - The raw, unparsed request body
    /// * `header` - The `Stripe-Signature` header value
    ///
    /// # Returns
    ///
    /// `true` if any `v1` signature matches any configured secret and the
    /// signed timestamp is within the tolerance, `false` otherwise.
    pub fn verify(&self, payload: &[u8], header: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.verify_at(payload, header, now)
    }

    fn verify_at(&self, payload: &[u8], header: &str, now: u64) -> bool {
        if !self.is_enabled() {
            warn!("stripe_signature_no_secret_configured");
            return false;
        }

        let Some((timestamp, signatures)) = parse_signature_header(header) else {
            warn!(header_length = header.len(), "stripe_signature_malformed_header");
            return false;
        };

        let age = now.abs_diff(timestamp);
        if age > self.tolerance_secs {
            warn!(
                webhook_time = timestamp,
                current_time = now,
                age_seconds = age,
                max_age_seconds = self.tolerance_secs,
                "stripe_signature_stale"
            );
            return false;
        }

        let valid = self.secrets.iter().any(|secret| {
            let Some(expected) = compute_signature(secret, timestamp, payload) else {
                return false;
            };
            signatures
                .iter()
                .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())))
        });

        if !valid {
            warn!(
                candidates = signatures.len(),
                secrets = self.secrets.len(),
                "stripe_signature_mismatch"
            );
        }

        valid
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"` keyed with `secret`.
pub fn compute_signature(secret: &str, timestamp: u64, payload: &[u8]) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("stripe_signature_invalid_key");
            return None;
        }
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Split `t=...,v1=...,v1=...` into the timestamp and the `v1` signatures.
///
/// Other schemes (such as `v0`) are ignored.
fn parse_signature_header(header: &str) -> Option<(u64, Vec<&str>)> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<u64>().ok(),
            Some(("v1", value)) if !value.is_empty() => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(t) if !signatures.is_empty() => Some((t, signatures)),
        _ => None,
    }
}

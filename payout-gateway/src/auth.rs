//! Bearer token authentication.
//!
//! Handlers take an [`AuthenticatedUser`] to require a verified user id.
//! Verification itself sits behind the [`Authenticator`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::error::ErrorResponse;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("authentication is not configured")]
    NotConfigured,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Verification(value.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        warn!(error = %self, "auth_rejected");
        let detail = match self {
            AuthError::MissingAuthorization | AuthError::InvalidAuthorization => self.to_string(),
            _ => "invalid credentials".to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(ErrorResponse { detail })).into_response()
    }
}

/// Turns a bearer token into a user id.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<String, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// HS256 JWT verifier; the `sub` claim is the user id.
pub struct JwtAuthenticator {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtAuthenticator {
    /// Without a secret every token is rejected.
    pub fn new(
        secret: Option<&str>,
        issuer: Option<&str>,
        audience: Option<&[String]>,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) if !audience.is_empty() => validation.set_audience(audience),
            _ => validation.validate_aud = false,
        }

        Self {
            key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
            validation,
        }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        let key = self.key.as_ref().ok_or(AuthError::NotConfigured)?;
        let data = decode::<Claims>(token, key, &self.validation)?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::Verification("empty subject".to_string()));
        }
        Ok(data.claims.sub)
    }
}

/// Verified user id of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<dyn Authenticator>::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = parse_bearer(header_value)?;
        let uid = authenticator.authenticate(token).await?;

        Ok(Self(uid))
    }
}

fn parse_bearer(value: &HeaderValue) -> Result<&str, AuthError> {
    let token = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim()
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token)
}

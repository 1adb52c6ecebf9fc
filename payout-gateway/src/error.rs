//! Service errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;
use crate::stripe::StripeError;

/// Every way a gateway operation can fail.
///
/// All variants are terminal for the request. No side effect has been
/// performed when one of the webhook variants is returned.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid payload")]
    InvalidPayload(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid client")]
    InvalidClientReference,

    /// Upstream Stripe failure, message passed through verbatim.
    #[error("{0}")]
    ProcessorError(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Invalid method")]
    InvalidMethod(String),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl From<StripeError> for PaymentError {
    fn from(e: StripeError) -> Self {
        PaymentError::ProcessorError(e.to_string())
    }
}

/// JSON error body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::InvalidSignature => StatusCode::UNAUTHORIZED,
            PaymentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PaymentError::InvalidPayload(_)
            | PaymentError::InvalidClientReference
            | PaymentError::ProcessorError(_)
            | PaymentError::ValidationError(_)
            | PaymentError::InvalidMethod(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "request_failed");
        } else {
            warn!(error = %self, debug = ?self, status_code = status.as_u16(), "request_rejected");
        }

        let detail = match &self {
            // Storage internals stay in the logs.
            PaymentError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

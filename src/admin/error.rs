//! Admin API error mapping.
//!
//! Every failure leaves as `{"message": "..."}` with a status that tells the
//! caller whose fault it was: 400 bad input, 403 not the owner, 500 storage,
//! 502 outbound transport, or the upstream's own status.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::relay::RelayError;
use crate::routing::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Required identifier or payload missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Wallet mutation attempted by someone who does not own the wallet.
    #[error("wallet {wallet} is not owned by {owner}")]
    Authorization { owner: String, wallet: String },

    #[error("configuration storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("relay failed: {0}")]
    Relay(#[from] RelayError),

    /// Upstream answered with a non-success status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for admin handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Relay(RelayError::Storage(_) | RelayError::Blocking(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Relay(RelayError::Dispatch(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Admin request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

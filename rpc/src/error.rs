//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use verileaf_registry::RegistryError;
use verileaf_types::IdentityError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("signature does not match signer")]
    BadSignature,

    #[error("call issued {skew}s away from server time (limit {limit}s)")]
    StaleCall { skew: u64, limit: u64 },

    #[error("call was already submitted")]
    ReplayedCall,

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    /// HTTP status for this error.
    ///
    /// - Role check failed: 403
    /// - Bad arguments, malformed identity or body: 400
    /// - Signature, freshness or single-use check failed: 401
    /// - Store and server failures: 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Registry(RegistryError::Unauthorized(_)) => StatusCode::FORBIDDEN,
            Self::Registry(RegistryError::InvalidArgument(_))
            | Self::InvalidIdentity(_)
            | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::BadSignature | Self::StaleCall { .. } | Self::ReplayedCall => {
                StatusCode::UNAUTHORIZED
            }
            Self::Registry(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for the rejected-calls metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registry(e) => e.kind(),
            Self::InvalidIdentity(_) => "invalid_identity",
            Self::InvalidRequest(_) => "invalid_request",
            Self::BadSignature => "bad_signature",
            Self::StaleCall { .. } => "stale_call",
            Self::ReplayedCall => "replayed_call",
            Self::Server(_) => "server",
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Backend details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

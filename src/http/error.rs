//! Mapping gateway failures onto HTTP responses.
//!
//! | failure | status |
//! |---|---|
//! | bad input, malformed address | 400 |
//! | unknown credential | 404 |
//! | chain call/submit/revert, RPC error | 502 |
//! | chain unreachable | 503 |
//! | confirmation timeout | 504 |
//! | contract not bound, signer missing, rendering | 500 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::ChainError;
use crate::credentials::GatewayError;
use crate::presentation::PresentationError;

/// Error body: `{"detail": ..., "kind": ..., "transaction_hash"?: ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        Self(err.into())
    }
}

impl From<PresentationError> for ApiError {
    fn from(err: PresentationError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Presentation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Chain(e) => match e {
                ChainError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
                ChainError::Call(_)
                | ChainError::Rpc(_)
                | ChainError::Submit(_)
                | ChainError::TransactionBuild(_)
                | ChainError::TransactionFailed { .. } => StatusCode::BAD_GATEWAY,
                ChainError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
                ChainError::ConfirmationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ChainError::ContractNotInitialized
                | ChainError::Signing(_)
                | ChainError::Artifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match &self.0 {
            GatewayError::Validation(_) => "validation",
            GatewayError::NotFound => "not_found",
            GatewayError::Presentation(_) => "presentation",
            GatewayError::Chain(e) => match e {
                ChainError::Connection(_) => "connection",
                ChainError::ContractNotInitialized => "contract_not_initialized",
                ChainError::Artifact(_) => "artifact",
                ChainError::Call(_) => "chain_call",
                ChainError::TransactionBuild(_) => "transaction_build",
                ChainError::Signing(_) => "signing",
                ChainError::Submit(_) => "submit",
                ChainError::TransactionFailed { .. } => "transaction_failed",
                ChainError::ConfirmationTimeout { .. } => "timeout",
                ChainError::InvalidAddress(_) => "invalid_address",
                ChainError::Rpc(_) => "rpc",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, kind = self.kind(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status, kind = self.kind(), error = %self.0, "Request rejected");
        }

        let transaction_hash = match &self.0 {
            GatewayError::Chain(e) => e.tx_hash().map(|h| h.to_string()),
            _ => None,
        };
        let body = ErrorBody {
            detail: self.0.to_string(),
            kind: self.kind(),
            transaction_hash,
        };
        (status, Json(body)).into_response()
    }
}

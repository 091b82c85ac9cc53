//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blam_engine::{EngineError, ParseError};
use blam_types::ErrorKind;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl RpcError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Engine(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            Some(ErrorKind::PermissionDenied) => StatusCode::FORBIDDEN,
            Some(ErrorKind::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            Some(
                ErrorKind::OracleUnavailable
                | ErrorKind::RosterUnavailable
                | ErrorKind::StoreUnavailable,
            ) => StatusCode::SERVICE_UNAVAILABLE,
            Some(ErrorKind::AlreadyAbsent | ErrorKind::AlreadyPresent | ErrorKind::Exempt) => {
                StatusCode::CONFLICT
            }
            None => match self {
                Self::Parse(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl RpcError {
    /// The text callers see. Engine failures carry collaborator errors, so
    /// only their kind is exposed; the full chain goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::Engine(e @ EngineError::PermissionDenied { .. }) => e.to_string(),
            Self::Engine(e) => e.kind().describe().to_string(),
            Self::Server(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let detail = self.to_string();
            tracing::warn!(%status, "request failed: {detail}");
        }
        let body = ErrorResponse {
            error: self.public_message(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::types::{ErrorKind, LedgerError};

/// Handler error wrapping a [`LedgerError`]
///
/// Renders as `{success: false, message, error}` with a status derived from
/// the error's kind.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed on infrastructure error");
        }
        json_error(status, self.0.kind().code(), self.0.to_string())
    }
}

/// HTTP status for a ledger error
pub fn status_for(err: &LedgerError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::State => match err {
            LedgerError::AccountNotActive { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::CONFLICT,
        },
        ErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Concurrency | ErrorKind::SyncInProgress => StatusCode::CONFLICT,
        ErrorKind::Infrastructure => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

//! Body extractors that report malformed input in the JSON error envelope
//!
//! axum's own `Json` rejection is a plain-text response. These wrappers turn
//! it into `LedgerError::InvalidInput`, rendered by [`ApiError`] as a 400
//! `validation_error`.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;
use crate::types::LedgerError;

fn invalid_body(message: impl Into<String>) -> ApiError {
    ApiError(LedgerError::invalid_input("request body", message))
}

/// Required JSON body
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| invalid_body(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// JSON body that may be omitted
///
/// An empty body yields `T::default()`. A body that is present must parse;
/// the content type is not checked.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| invalid_body(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(OptionalJson)
            .map_err(|e| invalid_body(e.to_string()))
    }
}

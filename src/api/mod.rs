//! HTTP API (Axum router + handlers).
//!
//! - `routes/`: one file per resource
//! - `dto.rs`: request bodies and the response envelope
//! - `errors.rs`: error-to-status mapping
//! - `extract.rs`: body extractors with JSON rejections
//!
//! Every route is served at the root and again under `/api`.

use std::sync::Arc;

use axum::{Extension, Router};

use crate::core::LedgerService;
use crate::sync::Synchronizer;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;

/// Shared handles available to every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub ledger: Arc<LedgerService>,
    pub sync: Arc<Synchronizer>,
}

impl AppState {
    pub fn new(ledger: Arc<LedgerService>, sync: Arc<Synchronizer>) -> Self {
        Self { ledger, sync }
    }
}

/// Build the full HTTP router
pub fn build_app(state: AppState) -> Router {
    let routes = routes::router();
    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(Extension(state))
}

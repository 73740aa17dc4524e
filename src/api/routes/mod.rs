use axum::{routing::get, Router};

pub mod accounts;
pub mod audit;
pub mod customers;
pub mod sync;
pub mod system;
pub mod transactions;

/// Router for every ledger endpoint, without the `/api` prefix
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/customers", customers::router())
        .nest("/accounts", accounts::router())
        .nest("/transactions", transactions::router())
        .nest("/audit", audit::router())
        .nest("/sync", sync::router())
}

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::{dto, AppState};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/:id", get(get_customer))
}

pub async fn list_customers(Extension(state): Extension<AppState>) -> Json<Value> {
    let customers = state.ledger.customers();
    Json(dto::ok(None, json!({ "customers": customers })))
}

pub async fn get_customer(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let customer = state.ledger.customer(&id)?;
    Ok(Json(dto::ok(None, json!({ "customer": customer }))))
}

pub async fn create_customer(
    Extension(state): Extension<AppState>,
    ApiJson(body): ApiJson<dto::CreateCustomerRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = body.actor().to_string();
    let customer = state.ledger.create_customer(body.profile, &actor).await?;
    Ok(Json(dto::ok(
        Some("Customer created successfully"),
        json!({ "customer": customer }),
    )))
}

use axum::{
    extract::{Extension, Path},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::{dto, AppState};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/:account_number", get(get_account))
        .route("/:account_number/balance", get(get_balance))
        .route("/:account_number/status", put(update_status))
        .route("/customer/:customer_id", get(accounts_for_customer))
}

pub async fn list_accounts(Extension(state): Extension<AppState>) -> Json<Value> {
    let accounts = state.ledger.accounts();
    Json(dto::ok(None, json!({ "accounts": accounts })))
}

pub async fn create_account(
    Extension(state): Extension<AppState>,
    ApiJson(body): ApiJson<dto::CreateAccountRequest>,
) -> Result<Json<Value>, ApiError> {
    let account = state
        .ledger
        .open_account_named(&body.customer_id, &body.account_type, body.actor())
        .await?;
    Ok(Json(dto::ok(
        Some("Account created successfully"),
        json!({ "account": account }),
    )))
}

pub async fn get_account(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let account = state.ledger.account(&account_number)?;
    Ok(Json(dto::ok(None, json!({ "account": account }))))
}

pub async fn get_balance(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let account = state.ledger.account(&account_number)?;
    Ok(Json(dto::ok(
        None,
        json!({
            "accountNumber": account.account_number,
            "balance": account.balance,
            "currency": account.currency,
        }),
    )))
}

pub async fn accounts_for_customer(
    Extension(state): Extension<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let accounts = state.ledger.accounts_for_customer(&customer_id)?;
    Ok(Json(dto::ok(None, json!({ "accounts": accounts }))))
}

pub async fn update_status(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
    ApiJson(body): ApiJson<dto::UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let account = state
        .ledger
        .update_account_status_named(&account_number, &body.status, body.actor())
        .await?;
    Ok(Json(dto::ok(
        Some("Account status updated successfully"),
        json!({ "account": account }),
    )))
}

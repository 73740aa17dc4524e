use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, OptionalJson};
use crate::api::{dto, AppState};
use crate::core::StackOutcome;
use crate::types::TransactionType;

pub fn router() -> Router {
    Router::new()
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/transfer", post(transfer))
        .route("/account/:account_number", get(history))
        .route("/account/:account_number/deposits", get(deposits))
        .route("/account/:account_number/withdrawals", get(withdrawals))
        .route(
            "/account/:account_number/undo-redo-status",
            get(undo_redo_status),
        )
        .route("/undo/:account_number", post(undo))
        .route("/redo/:account_number", post(redo))
}

pub async fn deposit(
    Extension(state): Extension<AppState>,
    ApiJson(body): ApiJson<dto::AmountRequest>,
) -> Result<Json<Value>, ApiError> {
    let transaction = state
        .ledger
        .deposit(&body.account_number, body.amount, &body.description, body.actor())
        .await?;
    Ok(Json(dto::ok(
        Some("Deposit processed successfully"),
        json!({ "transaction": transaction }),
    )))
}

pub async fn withdraw(
    Extension(state): Extension<AppState>,
    ApiJson(body): ApiJson<dto::AmountRequest>,
) -> Result<Json<Value>, ApiError> {
    let transaction = state
        .ledger
        .withdraw(&body.account_number, body.amount, &body.description, body.actor())
        .await?;
    Ok(Json(dto::ok(
        Some("Withdrawal processed successfully"),
        json!({ "transaction": transaction }),
    )))
}

pub async fn transfer(
    Extension(state): Extension<AppState>,
    ApiJson(body): ApiJson<dto::TransferRequest>,
) -> Result<Json<Value>, ApiError> {
    let (outgoing, incoming) = state
        .ledger
        .transfer(
            &body.source_account_number,
            &body.destination_account_number,
            body.amount,
            &body.description,
            body.actor(),
        )
        .await?;
    Ok(Json(dto::ok(
        Some("Transfer processed successfully"),
        json!({
            "transaction": outgoing,
            "transactions": [outgoing, incoming],
        }),
    )))
}

pub async fn history(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let transactions = state.ledger.history(&account_number)?;
    Ok(Json(dto::ok(None, json!({ "transactions": transactions }))))
}

pub async fn deposits(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let transactions = state
        .ledger
        .history_of_type(&account_number, TransactionType::Deposit)?;
    Ok(Json(dto::ok(None, json!({ "transactions": transactions }))))
}

pub async fn withdrawals(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let transactions = state
        .ledger
        .history_of_type(&account_number, TransactionType::Withdraw)?;
    Ok(Json(dto::ok(None, json!({ "transactions": transactions }))))
}

pub async fn undo_redo_status(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let status = state.ledger.undo_redo_status(&account_number)?;
    Ok(Json(dto::ok(None, json!(status))))
}

pub async fn undo(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
    OptionalJson(body): OptionalJson<dto::StackRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .ledger
        .undo(&account_number, body.actor(), body.include_linked)
        .await?;
    Ok(Json(stack_response(
        "Transaction undone successfully",
        "undoneTransaction",
        &outcome,
    )))
}

pub async fn redo(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
    OptionalJson(body): OptionalJson<dto::StackRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .ledger
        .redo(&account_number, body.actor(), body.include_linked)
        .await?;
    Ok(Json(stack_response(
        "Transaction redone successfully",
        "redoneTransaction",
        &outcome,
    )))
}

fn stack_response(message: &str, target_field: &str, outcome: &StackOutcome) -> Value {
    let mut payload = dto::stack_effect_json(&outcome.primary, target_field);
    if let (Some(linked), Value::Object(fields)) = (&outcome.linked, &mut payload) {
        fields.insert(
            "linked".to_string(),
            dto::stack_effect_json(linked, target_field),
        );
    }
    dto::ok(Some(message), payload)
}

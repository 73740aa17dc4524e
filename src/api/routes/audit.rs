use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::{dto, AppState};
use crate::types::AuditFilter;

pub fn router() -> Router {
    Router::new()
        .route("/logs", get(logs))
        .route("/logs/date-range", get(logs))
        .route("/logs/user/:user_id", get(logs_for_user))
        .route("/logs/action/:action", get(logs_for_action))
        .route("/logs/entity/:entity_type/:entity_id", get(logs_for_entity))
        .route("/stats", get(stats))
}

fn respond(state: &AppState, filter: &AuditFilter) -> Json<Value> {
    let logs = state.ledger.audit().query(filter);
    Json(dto::ok(None, json!({ "count": logs.len(), "logs": logs })))
}

pub async fn logs(
    Extension(state): Extension<AppState>,
    Query(filter): Query<AuditFilter>,
) -> Json<Value> {
    respond(&state, &filter)
}

pub async fn logs_for_user(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
    Query(filter): Query<AuditFilter>,
) -> Json<Value> {
    respond(
        &state,
        &AuditFilter {
            user_id: Some(user_id),
            ..filter
        },
    )
}

pub async fn logs_for_action(
    Extension(state): Extension<AppState>,
    Path(action): Path<String>,
    Query(filter): Query<AuditFilter>,
) -> Json<Value> {
    respond(
        &state,
        &AuditFilter {
            action: Some(action),
            ..filter
        },
    )
}

pub async fn logs_for_entity(
    Extension(state): Extension<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Query(filter): Query<AuditFilter>,
) -> Json<Value> {
    respond(
        &state,
        &AuditFilter {
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
            ..filter
        },
    )
}

pub async fn stats(Extension(state): Extension<AppState>) -> Json<Value> {
    let stats = state.ledger.audit().stats();
    Json(dto::ok(None, json!(stats)))
}

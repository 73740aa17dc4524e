//! Request bodies and response helpers
//!
//! Request field names are camelCase. `userId` identifies the actor recorded
//! in the audit trail and falls back to [`ANONYMOUS_ACTOR`] when absent.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::core::StackEffect;
use crate::types::CustomerProfile;

/// Actor recorded when a request carries no `userId`
pub const ANONYMOUS_ACTOR: &str = "anonymous";

fn actor_or_anonymous(user_id: &Option<String>) -> &str {
    match user_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => ANONYMOUS_ACTOR,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[serde(flatten)]
    pub profile: CustomerProfile,
    pub user_id: Option<String>,
}

impl CreateCustomerRequest {
    pub fn actor(&self) -> &str {
        actor_or_anonymous(&self.user_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub customer_id: String,
    pub account_type: String,
    pub user_id: Option<String>,
}

impl CreateAccountRequest {
    pub fn actor(&self) -> &str {
        actor_or_anonymous(&self.user_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub user_id: Option<String>,
}

impl UpdateStatusRequest {
    pub fn actor(&self) -> &str {
        actor_or_anonymous(&self.user_id)
    }
}

/// Body of deposit and withdrawal requests
///
/// `amount` accepts a JSON number or a decimal string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    pub account_number: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub user_id: Option<String>,
}

impl AmountRequest {
    pub fn actor(&self) -> &str {
        actor_or_anonymous(&self.user_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source_account_number: String,
    pub destination_account_number: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub user_id: Option<String>,
}

impl TransferRequest {
    pub fn actor(&self) -> &str {
        actor_or_anonymous(&self.user_id)
    }
}

/// Body of undo and redo requests; may be omitted entirely
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub include_linked: bool,
}

impl StackRequest {
    pub fn actor(&self) -> &str {
        actor_or_anonymous(&self.user_id)
    }
}

/// Successful response envelope: `{success: true, message?, ...payload}`
///
/// `payload` must be a JSON object; its fields are merged into the envelope.
pub fn ok(message: Option<&str>, payload: Value) -> Value {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    if let Some(message) = message {
        body.insert("message".to_string(), Value::String(message.to_string()));
    }
    if let Value::Object(fields) = payload {
        body.extend(fields);
    }
    Value::Object(body)
}

/// `{transaction, <target_field>}` for one undo/redo effect
pub fn stack_effect_json(effect: &StackEffect, target_field: &str) -> Value {
    let mut body = Map::new();
    body.insert("transaction".to_string(), json!(effect.record));
    body.insert(target_field.to_string(), json!(effect.target));
    Value::Object(body)
}

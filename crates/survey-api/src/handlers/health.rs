use axum::Json;
use serde_json::{Value, json};

/// `GET /v1/health`
pub async fn handler() -> Json<Value> { Json(json!({ "ok": true })) }

pub mod activity_logs;
pub mod auth;
pub mod field_reports;
pub mod metrics;
pub mod profiles;
pub mod projects;
pub mod vba_projects;

use axum::Json;
use serde_json::{Value, json};

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

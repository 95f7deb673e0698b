use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::{core::publishing::PipelineStatus, AppState};

pub async fn health_checker_handler() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Trainee publisher is running",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn publisher_stats_handler(State(state): State<AppState>) -> Json<PipelineStatus> {
    Json(state.pipeline.status().await)
}

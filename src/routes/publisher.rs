use crate::{
    handlers::{health_checker_handler, publisher_stats_handler},
    AppState,
};
use axum::{routing::get, Router};

/// Ops endpoints for the publish pipeline
pub fn publisher_router() -> Router<AppState> {
    Router::new()
        .route("/healthchecker", get(health_checker_handler))
        .route("/publisher/stats", get(publisher_stats_handler))
}

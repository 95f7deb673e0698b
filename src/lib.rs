//! Trainee publisher - reliable domain event publishing with publisher confirms
//!
//! Tracks every publish until the broker confirms it, republishes nacked and
//! unconfirmed messages within a bounded retry budget, and raises an alert
//! for anything left unconfirmed too long.

use std::sync::Arc;

pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream entry point for in-process producers.
    pub publisher: Arc<services::ConditionsOfJoiningPublisher>,
    pub pipeline: Arc<core::publishing::PublishPipeline<domain::ConditionsOfJoiningSignedEvent>>,
}

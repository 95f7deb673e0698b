use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;

/// Alert severity levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
    Emergency,
}

/// Alert structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    pub source_component: String,
    pub labels: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        severity: AlertSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
        source_component: impl Into<String>,
    ) -> Self {
        Self {
            alert_id: Uuid::new_v4().to_string(),
            severity,
            title: title.into(),
            description: description.into(),
            source_component: source_component.into(),
            labels: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Operational alerting sink. Downstream systems turn alerts into pages.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn raise(&self, alert: Alert) -> Result<()>;
}

/// Emits each alert as a structured tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn raise(&self, alert: Alert) -> Result<()> {
        match alert.severity {
            AlertSeverity::Critical | AlertSeverity::Emergency => error!(
                alert_id = %alert.alert_id,
                severity = ?alert.severity,
                source = %alert.source_component,
                labels = ?alert.labels,
                title = %alert.title,
                "{}",
                alert.description
            ),
            AlertSeverity::Warning => warn!(
                alert_id = %alert.alert_id,
                source = %alert.source_component,
                labels = ?alert.labels,
                title = %alert.title,
                "{}",
                alert.description
            ),
            AlertSeverity::Info => info!(
                alert_id = %alert.alert_id,
                source = %alert.source_component,
                title = %alert.title,
                "{}",
                alert.description
            ),
        }
        Ok(())
    }
}

/// Keeps raised alerts in memory for inspection.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: RwLock<Vec<Alert>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.alerts.read().await.len()
    }

    pub async fn clear(&self) {
        self.alerts.write().await.clear();
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn raise(&self, alert: Alert) -> Result<()> {
        self.alerts.write().await.push(alert);
        Ok(())
    }
}

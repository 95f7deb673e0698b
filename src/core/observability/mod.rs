//! Operational alerting

pub mod alerting;

pub use alerting::{Alert, AlertSeverity, AlertSink, RecordingAlertSink, TracingAlertSink};

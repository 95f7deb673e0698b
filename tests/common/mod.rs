// Test utilities and common setup
#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tracing::subscriber::DefaultGuard;
use trainee_publisher::{
    config::PublisherConfig,
    core::{clock::ManualClock, observability::RecordingAlertSink, publishing::PublishPipeline},
    domain::{ConditionsOfJoining, ConditionsOfJoiningSignedEvent},
    infrastructure::broker::InMemoryBroker,
};

/// Pipeline wired to an in-memory broker, a manual clock and a recording
/// alert sink.
pub struct TestEnvironment {
    pub clock: Arc<ManualClock>,
    pub broker: Arc<InMemoryBroker>,
    pub alerts: Arc<RecordingAlertSink>,
    pub pipeline: PublishPipeline<ConditionsOfJoiningSignedEvent>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self::with_config(PublisherConfig::default()).await
    }

    pub async fn with_max_retries(max_retries: u32) -> Self {
        Self::with_config(PublisherConfig {
            max_retries,
            ..PublisherConfig::default()
        })
        .await
    }

    pub async fn with_config(config: PublisherConfig) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let broker = Arc::new(InMemoryBroker::new(clock.clone()));
        let alerts = Arc::new(RecordingAlertSink::new());
        let pipeline = PublishPipeline::new(broker.clone(), alerts.clone(), clock.clone(), config)
            .await
            .expect("pipeline config should be valid");

        Self {
            clock,
            broker,
            alerts,
            pipeline,
        }
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }
}

pub fn coj_signed(membership_id: &str) -> ConditionsOfJoiningSignedEvent {
    ConditionsOfJoiningSignedEvent {
        membership_id: membership_id.to_string(),
        person_id: "47165".to_string(),
        programme_name: "General Practice".to_string(),
        conditions_of_joining: ConditionsOfJoining {
            signed_at: Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap(),
            version: "GG9".to_string(),
        },
    }
}

/// Tracing output captured on the current thread until dropped.
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn start() -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || SharedBuffer(writer.clone()))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        Self {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

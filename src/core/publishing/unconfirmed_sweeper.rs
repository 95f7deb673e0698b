//! Alert-only sweep over publishes that have waited too long for a confirm.
//!
//! Never removes or republishes anything. An entry that stays unconfirmed
//! across two sweeps is alerted on twice.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::stats::PublisherStats;
use super::store::{OutstandingConfirmStore, StaleConfirm};
use crate::core::clock::{to_chrono, Clock};
use crate::core::observability::alerting::{Alert, AlertSeverity, AlertSink};

const SOURCE_COMPONENT: &str = "unconfirmed_sweeper";

pub struct UnconfirmedSweeper<P> {
    store: Arc<OutstandingConfirmStore<P>>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    stats: Arc<PublisherStats>,
    max_unconfirmed_age: Duration,
}

impl<P: Send + Sync + 'static> UnconfirmedSweeper<P> {
    pub fn new(
        store: Arc<OutstandingConfirmStore<P>>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
        stats: Arc<PublisherStats>,
        max_unconfirmed_age: Duration,
    ) -> Self {
        Self {
            store,
            alerts,
            clock,
            stats,
            max_unconfirmed_age,
        }
    }

    /// Raise one alert per entry older than the max unconfirmed age and
    /// return how many were found.
    pub async fn sweep(&self) -> usize {
        let cutoff = self.clock.now() - to_chrono(self.max_unconfirmed_age);
        let stale = self.store.older_than(cutoff);

        for entry in &stale {
            if let Err(e) = self.alerts.raise(abandoned_alert(entry)).await {
                error!(id = %entry.id, error = %e, "Failed to raise unconfirmed publish alert");
            }
        }

        let count = stale.len();
        self.stats.record_alerts(count as u64);
        if count > 0 {
            warn!(count = count, "Found unconfirmed publishes older than max age");
        } else {
            debug!("No unconfirmed publishes past max age");
        }
        count
    }
}

fn abandoned_alert(entry: &StaleConfirm) -> Alert {
    Alert::new(
        AlertSeverity::Critical,
        "Unconfirmed message publish",
        format!("message for id {} abandoned, never confirmed", entry.id),
        SOURCE_COMPONENT,
    )
    .with_label("correlation_id", entry.id.clone())
    .with_label("retry_count", entry.retry_count.to_string())
    .with_label("enqueued_at", entry.enqueued_at.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::observability::alerting::RecordingAlertSink;
    use crate::error::{AppError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<OutstandingConfirmStore<&'static str>>,
        alerts: Arc<RecordingAlertSink>,
        sweeper: UnconfirmedSweeper<&'static str>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(OutstandingConfirmStore::new());
        let alerts = Arc::new(RecordingAlertSink::new());
        let sweeper = UnconfirmedSweeper::new(
            store.clone(),
            alerts.clone(),
            clock.clone(),
            Arc::new(PublisherStats::new()),
            Duration::from_secs(10),
        );
        Fixture {
            clock,
            store,
            alerts,
            sweeper,
        }
    }

    #[tokio::test]
    async fn test_no_aged_entries_no_alerts() {
        let f = fixture();
        f.store.insert("fresh", "p", 0, f.clock.now());
        f.clock.advance(Duration::from_secs(5));

        assert_eq!(f.sweeper.sweep().await, 0);
        assert_eq!(f.alerts.count().await, 0);
    }

    #[tokio::test]
    async fn test_alerts_once_per_aged_entry_without_removing() {
        let f = fixture();
        for id in ["1", "2", "3"] {
            f.store.insert(id, "p", 0, f.clock.now());
        }
        f.clock.advance(Duration::from_secs(11));
        f.store.insert("young", "p", 0, f.clock.now());

        assert_eq!(f.sweeper.sweep().await, 3);
        assert_eq!(f.alerts.count().await, 3);
        assert_eq!(f.store.len(), 4);

        let alerts = f.alerts.alerts().await;
        assert!(alerts
            .iter()
            .all(|a| a.source_component == SOURCE_COMPONENT && a.severity == AlertSeverity::Critical));
        assert!(alerts[0].description.contains("never confirmed"));
    }

    #[tokio::test]
    async fn test_repeat_sweep_realerts() {
        let f = fixture();
        f.store.insert("stuck", "p", 1, f.clock.now());
        f.clock.advance(Duration::from_secs(30));

        assert_eq!(f.sweeper.sweep().await, 1);
        assert_eq!(f.sweeper.sweep().await, 1);
        assert_eq!(f.alerts.count().await, 2);
        assert_eq!(f.alerts.alerts().await[0].label("retry_count"), Some("1"));
    }

    struct FlakySink {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlertSink for FlakySink {
        async fn raise(&self, _alert: Alert) -> Result<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AppError::AlertDeliveryError("sink offline".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_sweep() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(OutstandingConfirmStore::new());
        let sink = Arc::new(FlakySink {
            calls: AtomicUsize::new(0),
        });
        store.insert("a", (), 0, clock.now());
        store.insert("b", (), 0, clock.now());
        clock.advance(Duration::from_secs(60));

        let sweeper = UnconfirmedSweeper::new(
            store,
            sink.clone(),
            clock,
            Arc::new(PublisherStats::new()),
            Duration::from_secs(10),
        );

        assert_eq!(sweeper.sweep().await, 2);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{BrokerClient, ConfirmListener};
use crate::core::clock::{to_chrono, Clock};
use crate::core::publishing::CorrelationRecord;
use crate::error::{AppError, Result};

/// A message accepted by the in-memory broker.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub exchange: String,
    pub routing_key: String,
    pub body: Vec<u8>,
    pub correlation: CorrelationRecord,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PendingConfirm {
    correlation: CorrelationRecord,
    sent_at: DateTime<Utc>,
}

/// Loopback broker that keeps everything in process.
///
/// Confirms are driven explicitly through [`InMemoryBroker::ack`] and
/// [`InMemoryBroker::nack`], or immediately on send when auto-confirm is on.
pub struct InMemoryBroker {
    clock: Arc<dyn Clock>,
    listener: RwLock<Option<Arc<dyn ConfirmListener>>>,
    pending: Mutex<Vec<PendingConfirm>>,
    sent: Mutex<Vec<SentMessage>>,
    failures_remaining: AtomicUsize,
    auto_confirm: bool,
}

impl InMemoryBroker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            listener: RwLock::new(None),
            pending: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(0),
            auto_confirm: false,
        }
    }

    /// Broker that acks every send as soon as it is accepted.
    pub fn with_auto_confirm(clock: Arc<dyn Clock>) -> Self {
        Self {
            auto_confirm: true,
            ..Self::new(clock)
        }
    }

    /// Make the next `count` sends fail with a transport error.
    pub fn fail_sends(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_send(&self) {
        self.fail_sends(1);
    }

    /// Confirm the most recent pending send for `id`.
    pub async fn ack(&self, id: &str) -> bool {
        self.confirm(id, true, None).await
    }

    /// Reject the most recent pending send for `id`.
    pub async fn nack(&self, id: &str, cause: impl Into<String>) -> bool {
        self.confirm(id, false, Some(cause.into())).await
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn confirm(&self, id: &str, ack: bool, cause: Option<String>) -> bool {
        let record = {
            let mut pending = self.pending.lock().await;
            match pending.iter().rposition(|p| p.correlation.id() == id) {
                Some(index) => pending.remove(index).correlation,
                None => {
                    warn!(id = %id, ack = ack, "No pending publish to confirm");
                    return false;
                }
            }
        };

        self.notify(record, ack, cause).await;
        true
    }

    async fn notify(&self, record: CorrelationRecord, ack: bool, cause: Option<String>) {
        let listener = self.listener.read().await.clone();
        match listener {
            Some(listener) => listener.on_confirm(record, ack, cause).await,
            None => debug!(correlation = %record, ack = ack, "Confirm dropped, no listener registered"),
        }
    }
}

#[async_trait]
impl BrokerClient for InMemoryBroker {
    async fn send(
        &self,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
        correlation: &CorrelationRecord,
    ) -> Result<()> {
        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(AppError::TransportError(format!(
                "simulated send failure for {}",
                correlation
            )));
        }

        let sent_at = self.clock.now();
        self.sent.lock().await.push(SentMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            body,
            correlation: correlation.clone(),
            sent_at,
        });

        if self.auto_confirm {
            self.notify(correlation.clone(), true, None).await;
        } else {
            self.pending.lock().await.push(PendingConfirm {
                correlation: correlation.clone(),
                sent_at,
            });
        }
        Ok(())
    }

    async fn set_confirm_listener(&self, listener: Arc<dyn ConfirmListener>) {
        *self.listener.write().await = Some(listener);
    }

    async fn take_unconfirmed(&self, older_than: Duration) -> Vec<CorrelationRecord> {
        let cutoff = self.clock.now() - to_chrono(older_than);
        let mut pending = self.pending.lock().await;

        let (expired, fresh): (Vec<_>, Vec<_>) =
            pending.drain(..).partition(|p| p.sent_at < cutoff);
        *pending = fresh;

        expired.into_iter().map(|p| p.correlation).collect()
    }
}

use async_trait::async_trait;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::correlation::CorrelationRecord;
use super::nack_queue::NegativeAckQueue;
use super::stats::PublisherStats;
use super::store::OutstandingConfirmStore;
use crate::config::PublisherConfig;
use crate::core::clock::Clock;
use crate::error::Result;
use crate::infrastructure::broker::{BrokerClient, ConfirmListener};

/// A domain object that can be published with confirm tracking.
pub trait PublishPayload: Serialize + Clone + Send + Sync + 'static {
    /// Business identifier reused as the correlation id on every attempt.
    fn correlation_id(&self) -> &str;
}

/// The only component that sends to the broker.
pub struct PublishGateway<P> {
    broker: Arc<dyn BrokerClient>,
    store: Arc<OutstandingConfirmStore<P>>,
    clock: Arc<dyn Clock>,
    stats: Arc<PublisherStats>,
    exchange: String,
    routing_key: String,
}

impl<P: PublishPayload> PublishGateway<P> {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        store: Arc<OutstandingConfirmStore<P>>,
        clock: Arc<dyn Clock>,
        stats: Arc<PublisherStats>,
        config: &PublisherConfig,
    ) -> Self {
        Self {
            broker,
            store,
            clock,
            stats,
            exchange: config.exchange.clone(),
            routing_key: config.routing_key.clone(),
        }
    }

    /// First publish of a domain event.
    pub async fn publish(&self, payload: P) -> Result<()> {
        self.publish_with_retry_count(payload, 0).await
    }

    /// Publish with tracking.
    ///
    /// The store entry is written before the send so a confirm racing the
    /// send always finds it. A transport failure restores whatever entry the
    /// write replaced (or removes it if there was none) and is returned to the
    /// caller without retrying.
    pub async fn publish_with_retry_count(&self, payload: P, retry_count: u32) -> Result<()> {
        let record = CorrelationRecord::with_retry_count(payload.correlation_id(), retry_count);
        let body = serde_json::to_vec(&payload)?;

        let previous = self
            .store
            .insert(record.id(), payload, retry_count, self.clock.now());

        if let Err(e) = self
            .broker
            .send(&self.exchange, &self.routing_key, body, &record)
            .await
        {
            match previous {
                // An earlier attempt is still awaiting its confirm.
                Some(prev) => {
                    self.store
                        .insert(record.id(), prev.payload, prev.retry_count, prev.enqueued_at);
                }
                None => {
                    self.store.remove(record.id());
                }
            }
            self.stats.record_transport_failure();
            error!(
                correlation = %record,
                exchange = %self.exchange,
                error = %e,
                "Failed to send message to broker"
            );
            return Err(e);
        }

        self.stats.record_published();
        debug!(
            correlation = %record,
            exchange = %self.exchange,
            routing_key = %self.routing_key,
            "Published message awaiting confirm"
        );
        Ok(())
    }

    pub fn store(&self) -> &Arc<OutstandingConfirmStore<P>> {
        &self.store
    }
}

/// Routes broker confirms into the store and the nack queue.
pub struct ConfirmCallback<P> {
    store: Arc<OutstandingConfirmStore<P>>,
    nacks: Arc<NegativeAckQueue>,
    stats: Arc<PublisherStats>,
    _payload: PhantomData<fn() -> P>,
}

impl<P> ConfirmCallback<P> {
    pub fn new(
        store: Arc<OutstandingConfirmStore<P>>,
        nacks: Arc<NegativeAckQueue>,
        stats: Arc<PublisherStats>,
    ) -> Self {
        Self {
            store,
            nacks,
            stats,
            _payload: PhantomData,
        }
    }
}

#[async_trait]
impl<P: Send + Sync + 'static> ConfirmListener for ConfirmCallback<P> {
    async fn on_confirm(&self, record: CorrelationRecord, ack: bool, cause: Option<String>) {
        if ack {
            let removed = self.store.remove(record.id());
            self.stats.record_confirmed();
            debug!(correlation = %record, tracked = removed, "Publish confirmed");
            return;
        }

        // Entry stays in the store; the retry sweeper takes it from there.
        self.stats.record_nacked();
        warn!(
            correlation = %record,
            cause = cause.as_deref().unwrap_or("unknown"),
            "Publish rejected by broker"
        );
        self.nacks.push(record).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::publishing::test_support::TestEvent;
    use crate::infrastructure::broker::InMemoryBroker;

    struct Fixture {
        broker: Arc<InMemoryBroker>,
        store: Arc<OutstandingConfirmStore<TestEvent>>,
        nacks: Arc<NegativeAckQueue>,
        stats: Arc<PublisherStats>,
        gateway: PublishGateway<TestEvent>,
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::default());
        let broker = Arc::new(InMemoryBroker::new(clock.clone()));
        let store = Arc::new(OutstandingConfirmStore::new());
        let nacks = Arc::new(NegativeAckQueue::new());
        let stats = Arc::new(PublisherStats::new());

        broker
            .set_confirm_listener(Arc::new(ConfirmCallback::new(
                store.clone(),
                nacks.clone(),
                stats.clone(),
            )))
            .await;

        let gateway = PublishGateway::new(
            broker.clone(),
            store.clone(),
            clock,
            stats.clone(),
            &PublisherConfig::default(),
        );

        Fixture {
            broker,
            store,
            nacks,
            stats,
            gateway,
        }
    }

    #[tokio::test]
    async fn test_publish_tracks_and_sends() {
        let f = fixture().await;
        f.gateway.publish(TestEvent::new("123")).await.unwrap();

        assert!(f.store.contains("123"));
        assert_eq!(f.store.retry_count_of("123"), Some(0));

        let sent = f.broker.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].exchange, "tis.trainee");
        assert_eq!(sent[0].routing_key, "coj.signed");
        assert_eq!(sent[0].correlation, CorrelationRecord::new("123"));
        let body: TestEvent = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(body, TestEvent::new("123"));
    }

    #[tokio::test]
    async fn test_ack_removes_entry() {
        let f = fixture().await;
        f.gateway.publish(TestEvent::new("123")).await.unwrap();

        f.broker.ack("123").await;

        assert!(!f.store.contains("123"));
        assert!(f.nacks.is_empty().await);
        assert_eq!(f.stats.snapshot().confirmed, 1);
    }

    #[tokio::test]
    async fn test_nack_keeps_entry_and_queues_record() {
        let f = fixture().await;
        f.gateway
            .publish_with_retry_count(TestEvent::new("123"), 2)
            .await
            .unwrap();

        f.broker.nack("123", "rejected").await;

        assert!(f.store.contains("123"));
        let queued = f.nacks.pop().await.unwrap();
        assert_eq!(queued, CorrelationRecord::with_retry_count("123", 2));
        assert_eq!(f.stats.snapshot().nacked, 1);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_and_untracks() {
        let f = fixture().await;
        f.broker.fail_next_send();

        let err = f.gateway.publish(TestEvent::new("123")).await.unwrap_err();

        assert!(err.is_transport());
        assert!(!f.store.contains("123"));
        assert_eq!(f.stats.snapshot().transport_failures, 1);
        assert_eq!(f.stats.snapshot().published, 0);
    }

    #[tokio::test]
    async fn test_failed_resend_keeps_earlier_attempt_tracked() {
        let f = fixture().await;
        f.gateway
            .publish_with_retry_count(TestEvent::new("123"), 1)
            .await
            .unwrap();
        let first_enqueued = f.store.enqueued_at("123");

        f.broker.fail_next_send();
        assert!(f.gateway.publish(TestEvent::new("123")).await.is_err());

        assert!(f.store.contains("123"));
        assert_eq!(f.store.retry_count_of("123"), Some(1));
        assert_eq!(f.store.enqueued_at("123"), first_enqueued);

        f.broker.nack("123", "rejected").await;
        assert_eq!(
            f.nacks.pop().await,
            Some(CorrelationRecord::with_retry_count("123", 1))
        );
        assert!(f.store.contains("123"));
    }

    #[tokio::test]
    async fn test_confirm_during_send_is_not_lost() {
        let clock = Arc::new(ManualClock::default());
        let broker = Arc::new(InMemoryBroker::with_auto_confirm(clock.clone()));
        let store = Arc::new(OutstandingConfirmStore::new());
        let stats = Arc::new(PublisherStats::new());
        broker
            .set_confirm_listener(Arc::new(ConfirmCallback::new(
                store.clone(),
                Arc::new(NegativeAckQueue::new()),
                stats.clone(),
            )))
            .await;
        let gateway = PublishGateway::new(
            broker,
            store.clone(),
            clock,
            stats,
            &PublisherConfig::default(),
        );

        gateway.publish(TestEvent::new("fast")).await.unwrap();

        assert!(store.is_empty());
    }
}

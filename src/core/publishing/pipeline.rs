use serde::Serialize;
use std::sync::Arc;

use super::gateway::{ConfirmCallback, PublishGateway, PublishPayload};
use super::nack_queue::NegativeAckQueue;
use super::retry_sweeper::RetrySweeper;
use super::stats::{PublisherStats, PublisherStatsSnapshot};
use super::store::OutstandingConfirmStore;
use super::unconfirmed_sweeper::UnconfirmedSweeper;
use crate::config::PublisherConfig;
use crate::core::clock::Clock;
use crate::core::observability::alerting::AlertSink;
use crate::core::scheduler::SweepScheduler;
use crate::error::Result;
use crate::infrastructure::broker::BrokerClient;

/// Point-in-time view of the pipeline, served on the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub outstanding_confirms: usize,
    pub nack_queue_depth: usize,
    pub max_retries: u32,
    pub stats: PublisherStatsSnapshot,
}

/// Wires the gateway, confirm callback and both sweepers around one shared
/// store and nack queue.
pub struct PublishPipeline<P> {
    config: PublisherConfig,
    store: Arc<OutstandingConfirmStore<P>>,
    nacks: Arc<NegativeAckQueue>,
    stats: Arc<PublisherStats>,
    gateway: Arc<PublishGateway<P>>,
    unconfirmed_sweeper: Arc<UnconfirmedSweeper<P>>,
    retry_sweeper: Arc<RetrySweeper<P>>,
}

impl<P: PublishPayload> PublishPipeline<P> {
    /// Build the pipeline and register its confirm callback with `broker`.
    pub async fn new(
        broker: Arc<dyn BrokerClient>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
        config: PublisherConfig,
    ) -> Result<Self> {
        config.validate()?;

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

        let gateway = Arc::new(PublishGateway::new(
            broker.clone(),
            store.clone(),
            clock.clone(),
            stats.clone(),
            &config,
        ));
        let unconfirmed_sweeper = Arc::new(UnconfirmedSweeper::new(
            store.clone(),
            alerts,
            clock.clone(),
            stats.clone(),
            config.max_unconfirmed_age,
        ));
        let retry_sweeper = Arc::new(RetrySweeper::new(
            gateway.clone(),
            store.clone(),
            nacks.clone(),
            broker,
            clock,
            stats.clone(),
            &config,
        ));

        Ok(Self {
            config,
            store,
            nacks,
            stats,
            gateway,
            unconfirmed_sweeper,
            retry_sweeper,
        })
    }

    /// Scheduler running both sweeps at their configured delays. Not started.
    pub fn scheduler(&self) -> SweepScheduler {
        let mut scheduler = SweepScheduler::new();
        scheduler.register(
            self.unconfirmed_sweeper.clone(),
            self.config.unconfirmed_sweep_interval,
        );
        scheduler.register(self.retry_sweeper.clone(), self.config.retry_sweep_interval);
        scheduler
    }

    pub fn gateway(&self) -> &Arc<PublishGateway<P>> {
        &self.gateway
    }

    pub fn store(&self) -> &Arc<OutstandingConfirmStore<P>> {
        &self.store
    }

    pub fn nack_queue(&self) -> &Arc<NegativeAckQueue> {
        &self.nacks
    }

    pub fn unconfirmed_sweeper(&self) -> &Arc<UnconfirmedSweeper<P>> {
        &self.unconfirmed_sweeper
    }

    pub fn retry_sweeper(&self) -> &Arc<RetrySweeper<P>> {
        &self.retry_sweeper
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub async fn status(&self) -> PipelineStatus {
        PipelineStatus {
            outstanding_confirms: self.store.len(),
            nack_queue_depth: self.nacks.len().await,
            max_retries: self.config.max_retries,
            stats: self.stats.snapshot(),
        }
    }
}

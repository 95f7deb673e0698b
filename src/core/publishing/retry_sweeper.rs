//! Recovery sweep: republishes nacked and unconfirmed publishes until the
//! retry budget runs out.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::correlation::CorrelationRecord;
use super::gateway::{PublishGateway, PublishPayload};
use super::nack_queue::NegativeAckQueue;
use super::retry_policy::{RetryDecision, RetryPolicy};
use super::stats::PublisherStats;
use super::store::OutstandingConfirmStore;
use crate::config::PublisherConfig;
use crate::core::clock::Clock;
use crate::infrastructure::broker::BrokerClient;

/// Where a record handed to the retry policy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrySource {
    Nacked,
    Unconfirmed,
}

impl fmt::Display for RetrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrySource::Nacked => write!(f, "nacked"),
            RetrySource::Unconfirmed => write!(f, "unconfirmed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Republished,
    Abandoned,
    /// Payload already taken by a confirm or another sweep.
    Missing,
    /// Republish hit a transport error; the attempt was put back on the nack queue.
    Requeued,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrySweepReport {
    pub nacks_drained: usize,
    pub unconfirmed_drained: usize,
    pub republished: usize,
    pub abandoned: usize,
    pub missing: usize,
    pub requeued: usize,
}

impl RetrySweepReport {
    fn record(&mut self, outcome: RetryOutcome) {
        match outcome {
            RetryOutcome::Republished => self.republished += 1,
            RetryOutcome::Abandoned => self.abandoned += 1,
            RetryOutcome::Missing => self.missing += 1,
            RetryOutcome::Requeued => self.requeued += 1,
        }
    }
}

pub struct RetrySweeper<P> {
    gateway: Arc<PublishGateway<P>>,
    store: Arc<OutstandingConfirmStore<P>>,
    nacks: Arc<NegativeAckQueue>,
    broker: Arc<dyn BrokerClient>,
    clock: Arc<dyn Clock>,
    stats: Arc<PublisherStats>,
    policy: RetryPolicy,
    batch_size: usize,
    unconfirmed_lookback: Duration,
}

impl<P: PublishPayload> RetrySweeper<P> {
    pub fn new(
        gateway: Arc<PublishGateway<P>>,
        store: Arc<OutstandingConfirmStore<P>>,
        nacks: Arc<NegativeAckQueue>,
        broker: Arc<dyn BrokerClient>,
        clock: Arc<dyn Clock>,
        stats: Arc<PublisherStats>,
        config: &PublisherConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            nacks,
            broker,
            clock,
            stats,
            policy: RetryPolicy::new(config.max_retries),
            batch_size: config.retry_batch_size,
            unconfirmed_lookback: config.max_unconfirmed_age,
        }
    }

    /// One tick: drain a batch of nacks, then the broker's unconfirmed sends.
    pub async fn sweep(&self) -> RetrySweepReport {
        let mut report = RetrySweepReport::default();
        self.drain_nacks(&mut report).await;
        self.drain_unconfirmed(&mut report).await;

        if report.nacks_drained + report.unconfirmed_drained > 0 {
            info!(
                nacks = report.nacks_drained,
                unconfirmed = report.unconfirmed_drained,
                republished = report.republished,
                abandoned = report.abandoned,
                missing = report.missing,
                requeued = report.requeued,
                "Retry sweep finished"
            );
        } else {
            debug!("Retry sweep found nothing to do");
        }
        report
    }

    async fn drain_nacks(&self, report: &mut RetrySweepReport) {
        let batch = self.nacks.pop_batch(self.batch_size).await;
        report.nacks_drained = batch.len();
        for record in batch {
            let outcome = self.recover(record, RetrySource::Nacked).await;
            report.record(outcome);
        }
    }

    async fn drain_unconfirmed(&self, report: &mut RetrySweepReport) {
        let records = self.broker.take_unconfirmed(self.unconfirmed_lookback).await;
        report.unconfirmed_drained = records.len();
        for record in records {
            let outcome = self.recover(record, RetrySource::Unconfirmed).await;
            report.record(outcome);
        }
    }

    async fn recover(&self, record: CorrelationRecord, source: RetrySource) -> RetryOutcome {
        let Some(entry) = self.store.take(record.id()) else {
            self.stats.record_missing_payload();
            warn!(
                correlation = %record,
                source = %source,
                "Could not retrieve payload for id, already cleaned"
            );
            return RetryOutcome::Missing;
        };

        // A stale record must not rewind the budget of a later attempt.
        let attempt = if entry.retry_count > record.retry_count() {
            CorrelationRecord::with_retry_count(record.id(), entry.retry_count)
        } else {
            record
        };

        let next = match self.policy.decide(&attempt) {
            RetryDecision::Republish(next) => next,
            RetryDecision::Abandon => {
                self.stats.record_abandoned();
                error!(
                    correlation = %attempt,
                    source = %source,
                    max_retries = self.policy.max_retries(),
                    "Retry limit reached for id {}, dropping message",
                    attempt.id()
                );
                return RetryOutcome::Abandoned;
            }
        };

        match self
            .gateway
            .publish_with_retry_count(entry.payload.clone(), next.retry_count())
            .await
        {
            Ok(()) => {
                self.stats.record_republished();
                info!(correlation = %next, source = %source, "Republished message");
                RetryOutcome::Republished
            }
            Err(e) => {
                // The failed send still spends budget, so a dead broker cannot loop forever.
                self.store
                    .insert(next.id(), entry.payload, next.retry_count(), self.clock.now());
                warn!(
                    correlation = %next,
                    source = %source,
                    error = %e,
                    "Republish failed, requeued for next sweep"
                );
                self.nacks.push(next).await;
                RetryOutcome::Requeued
            }
        }
    }
}

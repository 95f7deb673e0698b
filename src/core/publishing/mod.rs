//! Reliable publish pipeline
//!
//! Publishes domain events with publisher-confirm tracking. The gateway
//! records every attempt in the outstanding confirm store before sending;
//! broker confirms clear entries or queue nacks; the retry sweeper
//! republishes nacked and unconfirmed messages within a bounded budget; the
//! unconfirmed sweeper alerts on anything left waiting too long.

pub mod correlation;
pub mod gateway;
pub mod nack_queue;
pub mod pipeline;
pub mod retry_policy;
pub mod retry_sweeper;
pub mod stats;
pub mod store;
pub mod unconfirmed_sweeper;

#[cfg(test)]
pub(crate) mod test_support;

pub use correlation::CorrelationRecord;
pub use gateway::{ConfirmCallback, PublishGateway, PublishPayload};
pub use nack_queue::NegativeAckQueue;
pub use pipeline::{PipelineStatus, PublishPipeline};
pub use retry_policy::{RetryDecision, RetryPolicy};
pub use retry_sweeper::{RetryOutcome, RetrySource, RetrySweepReport, RetrySweeper};
pub use stats::{PublisherStats, PublisherStatsSnapshot};
pub use store::{OutstandingConfirm, OutstandingConfirmStore, StaleConfirm};
pub use unconfirmed_sweeper::UnconfirmedSweeper;

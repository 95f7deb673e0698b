use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::debug;

use super::correlation::CorrelationRecord;

/// FIFO of publishes the broker explicitly rejected.
///
/// Filled by the confirm callback, drained in bounded batches by the retry
/// sweeper. A popped record is gone from the queue, so each push is consumed
/// at most once.
#[derive(Debug, Default)]
pub struct NegativeAckQueue {
    records: Mutex<VecDeque<CorrelationRecord>>,
}

impl NegativeAckQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, record: CorrelationRecord) {
        let mut records = self.records.lock().await;
        debug!(correlation = %record, depth = records.len() + 1, "Queued nacked publish");
        records.push_back(record);
    }

    pub async fn pop(&self) -> Option<CorrelationRecord> {
        self.records.lock().await.pop_front()
    }

    /// Pop up to `max` records in arrival order.
    pub async fn pop_batch(&self, max: usize) -> Vec<CorrelationRecord> {
        let mut records = self.records.lock().await;
        let take = max.min(records.len());
        records.drain(..take).collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

use super::correlation::CorrelationRecord;

/// What to do with a recovered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Republish under this record (same id, retry count + 1).
    Republish(CorrelationRecord),
    /// Budget exhausted; drop the payload.
    Abandon,
}

/// Bounded retry budget shared by the nack and unconfirmed drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn decide(&self, record: &CorrelationRecord) -> RetryDecision {
        if record.retry_count() < self.max_retries {
            RetryDecision::Republish(record.next_attempt())
        } else {
            RetryDecision::Abandon
        }
    }
}

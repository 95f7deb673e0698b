use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation data attached to one publish attempt.
///
/// The id is the business identifier of the published entity and is reused
/// across retries; only the retry count changes between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationRecord {
    id: String,
    retry_count: u32,
}

impl CorrelationRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_retry_count(id, 0)
    }

    pub fn with_retry_count(id: impl Into<String>, retry_count: u32) -> Self {
        Self {
            id: id.into(),
            retry_count,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Record for the next republish of the same id.
    pub fn next_attempt(&self) -> Self {
        Self {
            id: self.id.clone(),
            retry_count: self.retry_count.saturating_add(1),
        }
    }
}

impl fmt::Display for CorrelationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id, self.retry_count)
    }
}

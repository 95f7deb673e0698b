//! Broker client contract
//!
//! The publish pipeline only needs three things from a broker: send a
//! message tagged with a correlation record, deliver publisher confirms to a
//! listener, and hand back sends that have gone unconfirmed for too long.

pub mod in_memory;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::publishing::CorrelationRecord;
use crate::error::Result;

pub use in_memory::{InMemoryBroker, SentMessage};

/// Receives publisher confirms from the broker's I/O path.
#[async_trait]
pub trait ConfirmListener: Send + Sync {
    /// `ack == false` is an explicit rejection; `cause` carries the broker's reason.
    async fn on_confirm(&self, record: CorrelationRecord, ack: bool, cause: Option<String>);
}

#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Send `body`, tagging it with `correlation`. Errors are transport failures.
    async fn send(
        &self,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
        correlation: &CorrelationRecord,
    ) -> Result<()>;

    /// Register the listener that receives confirms for every later send.
    async fn set_confirm_listener(&self, listener: Arc<dyn ConfirmListener>);

    /// Sends unconfirmed for longer than `older_than`. Returned records are
    /// released from the broker's own confirm tracking.
    async fn take_unconfirmed(&self, older_than: Duration) -> Vec<CorrelationRecord>;
}

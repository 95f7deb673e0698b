use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Pipeline counters shared by the gateway, the confirm callback and both
/// sweepers.
#[derive(Debug, Default)]
pub struct PublisherStats {
    published: AtomicU64,
    transport_failures: AtomicU64,
    confirmed: AtomicU64,
    nacked: AtomicU64,
    republished: AtomicU64,
    abandoned: AtomicU64,
    missing_payloads: AtomicU64,
    alerts_raised: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherStatsSnapshot {
    pub published: u64,
    pub transport_failures: u64,
    pub confirmed: u64,
    pub nacked: u64,
    pub republished: u64,
    pub abandoned: u64,
    pub missing_payloads: u64,
    pub alerts_raised: u64,
}

impl PublisherStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_confirmed(&self) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_nacked(&self) {
        self.nacked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_republished(&self) {
        self.republished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_payload(&self) {
        self.missing_payloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alerts(&self, count: u64) {
        self.alerts_raised.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PublisherStatsSnapshot {
        PublisherStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            confirmed: self.confirmed.load(Ordering::Relaxed),
            nacked: self.nacked.load(Ordering::Relaxed),
            republished: self.republished.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            missing_payloads: self.missing_payloads.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
        }
    }
}

//! Outstanding confirm store
//!
//! Concurrent map from correlation id to the payload awaiting a publisher
//! confirm. At most one entry exists per id; a republish overwrites it.
//! `take` is a single `DashMap::remove`, so no two callers can both obtain
//! the same entry.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// One publish attempt awaiting confirmation.
#[derive(Debug, Clone)]
pub struct OutstandingConfirm<P> {
    pub payload: P,
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
}

/// Payload-free view of an aged entry, as reported by the age sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleConfirm {
    pub id: String,
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
}

pub struct OutstandingConfirmStore<P> {
    entries: DashMap<String, OutstandingConfirm<P>>,
}

impl<P> OutstandingConfirmStore<P> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert or overwrite the entry for `id`, returning the replaced one.
    pub fn insert(
        &self,
        id: impl Into<String>,
        payload: P,
        retry_count: u32,
        enqueued_at: DateTime<Utc>,
    ) -> Option<OutstandingConfirm<P>> {
        self.entries.insert(
            id.into(),
            OutstandingConfirm {
                payload,
                retry_count,
                enqueued_at,
            },
        )
    }

    /// Atomically remove and return the entry for `id`.
    pub fn take(&self, id: &str) -> Option<OutstandingConfirm<P>> {
        self.entries.remove(id).map(|(_, entry)| entry)
    }

    pub fn remove(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn retry_count_of(&self, id: &str) -> Option<u32> {
        self.entries.get(id).map(|entry| entry.retry_count)
    }

    pub fn enqueued_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(id).map(|entry| entry.enqueued_at)
    }

    /// Entries last published strictly before `cutoff`, oldest first.
    pub fn older_than(&self, cutoff: DateTime<Utc>) -> Vec<StaleConfirm> {
        let mut stale: Vec<StaleConfirm> = self
            .entries
            .iter()
            .filter(|entry| entry.enqueued_at < cutoff)
            .map(|entry| StaleConfirm {
                id: entry.key().clone(),
                retry_count: entry.retry_count,
                enqueued_at: entry.enqueued_at,
            })
            .collect();
        stale.sort_by(|a, b| a.enqueued_at.cmp(&b.enqueued_at));
        stale
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> Default for OutstandingConfirmStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone> OutstandingConfirmStore<P> {
    pub fn get(&self, id: &str) -> Option<OutstandingConfirm<P>> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }
}

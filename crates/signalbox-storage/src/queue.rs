// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue of signals awaiting delivery.
//!
//! The whole queue lives under one key as a JSON array of [`QueueEntry`]
//! values, ordered by insertion. Every operation is best-effort: a storage
//! failure is reported to the observer and the call returns as if the queue
//! were empty (reads) or the write were skipped (writes). A read-modify-write
//! whose read fails leaves storage untouched. Nothing here ever surfaces an
//! error to the capture flow.

use std::collections::HashSet;
use std::sync::Arc;

use signalbox_core::{
    Clock, KeyValueStore, QueueEntry, Signal, SignalError, SignalId, StorageObserver, StorageOp,
};
use tokio::sync::Mutex;
use tracing::debug;

pub struct PersistedQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn StorageObserver>,
    /// Serializes read-modify-write cycles so concurrent enqueues and
    /// settles do not overwrite each other.
    lock: Mutex<()>,
}

impl PersistedQueue {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn StorageObserver>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            clock,
            observer,
            lock: Mutex::new(()),
        }
    }

    /// Appends a signal stamped with the current time. Returns whether the
    /// write reached storage.
    pub async fn enqueue(&self, signal: Signal) -> bool {
        let _guard = self.lock.lock().await;
        let Some(mut entries) = self.read_unlocked().await else {
            return false;
        };
        let id = signal.id.clone();
        entries.push(QueueEntry::from_signal(signal, self.clock.now()));
        let written = self.write_unlocked(&entries).await;
        if written {
            debug!(signal_id = %id, depth = entries.len(), "signal queued");
        }
        written
    }

    /// Current entries in insertion order. Missing or unreadable data reads
    /// as an empty queue.
    pub async fn read_all(&self) -> Vec<QueueEntry> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await.unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.read_all().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Overwrites the queue with exactly `entries`.
    pub async fn replace_all(&self, entries: &[QueueEntry]) -> bool {
        let _guard = self.lock.lock().await;
        self.write_unlocked(entries).await
    }

    /// Removes the queue key entirely.
    pub async fn clear(&self) -> bool {
        let _guard = self.lock.lock().await;
        self.clear_unlocked().await
    }

    /// Removes the given ids from the queue in one atomic step, keeping any
    /// entries added since the caller took its snapshot. Clears the key when
    /// nothing remains. Returns the number of entries left, or `None` when
    /// the queue could not be read and storage was left as it was.
    pub async fn settle(&self, resolved: &HashSet<SignalId>) -> Option<usize> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_unlocked().await?;
        entries.retain(|entry| !resolved.contains(entry.id()));
        if entries.is_empty() {
            self.clear_unlocked().await;
        } else {
            self.write_unlocked(&entries).await;
        }
        Some(entries.len())
    }

    /// `None` when the store itself failed. Undecodable data reads as empty.
    async fn read_unlocked(&self) -> Option<Vec<QueueEntry>> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(Vec::new()),
            Err(e) => {
                self.observer.storage_failure(StorageOp::Read, &self.key, &e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                self.observer
                    .storage_failure(StorageOp::Decode, &self.key, &SignalError::from(e));
                Some(Vec::new())
            }
        }
    }

    async fn write_unlocked(&self, entries: &[QueueEntry]) -> bool {
        let encoded = match serde_json::to_string(entries) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.observer
                    .storage_failure(StorageOp::Write, &self.key, &SignalError::from(e));
                return false;
            }
        };
        match self.store.set(&self.key, &encoded).await {
            Ok(()) => true,
            Err(e) => {
                self.observer.storage_failure(StorageOp::Write, &self.key, &e);
                false
            }
        }
    }

    async fn clear_unlocked(&self) -> bool {
        match self.store.remove(&[self.key.as_str()]).await {
            Ok(()) => true,
            Err(e) => {
                self.observer.storage_failure(StorageOp::Clear, &self.key, &e);
                false
            }
        }
    }
}

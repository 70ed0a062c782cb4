// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controllable clock, connectivity, and storage fakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use signalbox_core::{Clock, Connectivity, KeyValueStore, SignalError, StorageObserver, StorageOp};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.lock() += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Connectivity flag flipped by the test.
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
        })
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(false),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// In-memory [`KeyValueStore`] whose reads and writes can be made to fail,
/// e.g. to simulate an exhausted storage quota.
#[derive(Debug, Default)]
pub struct FailingStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStore {
    /// A store that fails every operation.
    pub fn broken() -> Arc<Self> {
        let store = Self::default();
        store.fail_reads.store(true, Ordering::SeqCst);
        store.fail_writes.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    /// A store that reads fine but rejects writes and removals.
    pub fn read_only() -> Arc<Self> {
        let store = Self::default();
        store.fail_writes.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Writes directly, bypassing fault injection.
    pub fn seed(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn fault(what: &str) -> SignalError {
        SignalError::Storage {
            source: Box::new(std::io::Error::other(format!("injected {what} failure: quota exceeded"))),
        }
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SignalError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::fault("read"));
        }
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SignalError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::fault("write"));
        }
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SignalError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::fault("write"));
        }
        let mut guard = self.lock();
        for (key, value) in entries {
            guard.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), SignalError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::fault("remove"));
        }
        let mut guard = self.lock();
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

/// Captures every absorbed storage failure.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<(StorageOp, String)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failures(&self) -> Vec<(StorageOp, String)> {
        self.failures
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }
}

impl StorageObserver for RecordingObserver {
    fn storage_failure(&self, op: StorageOp, key: &str, _error: &SignalError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((op, key.to_string()));
        }
    }
}

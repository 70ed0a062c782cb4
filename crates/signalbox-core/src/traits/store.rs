// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-addressed local storage trait (SQLite, in-memory, etc.).

use async_trait::async_trait;

use crate::error::SignalError;

/// Durable string key-value storage.
///
/// Values are opaque strings; callers own the encoding. Errors are returned
/// as-is: the best-effort wrappers in `signalbox-storage` decide what to
/// swallow.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, SignalError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), SignalError>;

    /// Writes several keys in a single atomic step.
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SignalError>;

    /// Removes the given keys. Missing keys are not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), SignalError>;
}

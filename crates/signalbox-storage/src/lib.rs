// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local persistence for the Signalbox capture pipeline.
//!
//! Provides a key-value store (SQLite via `tokio-rusqlite`, or in-memory),
//! and the two best-effort stores built on it: the offline signal queue and
//! the credential/session store. Both swallow storage failures and report
//! them to a [`StorageObserver`](signalbox_core::StorageObserver); durability
//! is best-effort, not guaranteed.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod queue;
pub mod session;

pub use database::Database;
pub use kv::{MemoryStore, SqliteStore};
pub use queue::PersistedQueue;
pub use session::{SessionKeys, SessionStore};

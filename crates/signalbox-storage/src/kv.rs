// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`KeyValueStore`] implementations: SQLite-backed and in-memory.

use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use signalbox_config::model::StorageConfig;
use signalbox_core::{KeyValueStore, SignalError};
use tokio::sync::Mutex;

use crate::database::{Database, map_tr_err};

const UPSERT: &str = "INSERT INTO kv (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value,
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// SQLite-backed key-value storage in the `kv` table.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the database described by the storage config.
    pub async fn open(config: &StorageConfig) -> Result<Self, SignalError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SignalError> {
        let key = key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row(
                    "SELECT value FROM kv WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SignalError> {
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(UPSERT, rusqlite::params![key, value])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SignalError> {
        let entries: Vec<(String, String)> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for (key, value) in &entries {
                    tx.execute(UPSERT, rusqlite::params![key, value])?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), SignalError> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for key in &keys {
                    tx.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Process-local storage, used for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SignalError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SignalError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SignalError> {
        let mut guard = self.entries.lock().await;
        for (key, value) in entries {
            guard.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), SignalError> {
        let mut guard = self.entries.lock().await;
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

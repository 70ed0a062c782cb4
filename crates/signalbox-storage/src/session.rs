// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locally cached bearer credential with a fixed validity window.
//!
//! The token and its storage timestamp are written together. A credential
//! read at or past `stored_at + validity` is treated as absent and the stored
//! keys are removed as a side effect of the read.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use signalbox_config::model::{SessionConfig, StorageConfig, MAX_VALIDITY_MINUTES};
use signalbox_core::{
    Clock, Credential, Identity, KeyValueStore, SignalError, StorageObserver, StorageOp,
};
use tracing::{debug, info};

/// Storage keys used by the session store.
#[derive(Debug, Clone)]
pub struct SessionKeys {
    pub token: String,
    pub stored_at: String,
    pub identity: String,
}

impl From<&StorageConfig> for SessionKeys {
    fn from(config: &StorageConfig) -> Self {
        Self {
            token: config.credential_key.clone(),
            stored_at: config.credential_stored_at_key.clone(),
            identity: config.identity_key.clone(),
        }
    }
}

pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    keys: SessionKeys,
    validity: TimeDelta,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn StorageObserver>,
}

impl SessionStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        keys: SessionKeys,
        validity: TimeDelta,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn StorageObserver>,
    ) -> Self {
        Self {
            store,
            keys,
            validity,
            clock,
            observer,
        }
    }

    pub fn from_config(
        store: Arc<dyn KeyValueStore>,
        storage: &StorageConfig,
        session: &SessionConfig,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn StorageObserver>,
    ) -> Self {
        Self::new(
            store,
            SessionKeys::from(storage),
            validity_window(session.validity_minutes),
            clock,
            observer,
        )
    }

    /// Records `token` with the current time as its storage timestamp.
    pub async fn store(&self, token: &str) -> bool {
        let stored_at = self.clock.now().to_rfc3339();
        let entries = [
            (self.keys.token.as_str(), token),
            (self.keys.stored_at.as_str(), stored_at.as_str()),
        ];
        match self.store.set_many(&entries).await {
            Ok(()) => {
                info!("credential stored");
                true
            }
            Err(e) => {
                self.observer
                    .storage_failure(StorageOp::Write, &self.keys.token, &e);
                false
            }
        }
    }

    /// Returns the credential if one is stored and still valid. An expired or
    /// half-written credential is cleared and reads as `None`.
    pub async fn load(&self) -> Option<Credential> {
        let token = self.read(&self.keys.token).await?;
        let Some(stored_at) = self.read_timestamp().await else {
            debug!("credential has no usable timestamp, clearing");
            self.clear().await;
            return None;
        };

        let credential = Credential::new(token, stored_at);
        let now = self.clock.now();
        if credential.is_valid_at(now, self.validity) {
            Some(credential)
        } else {
            debug!(%stored_at, "credential expired, clearing");
            self.clear().await;
            None
        }
    }

    /// When the current credential stops being valid, if there is one.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        let credential = self.load().await?;
        credential.stored_at.checked_add_signed(self.validity)
    }

    /// Removes the token, its timestamp, and the cached identity.
    pub async fn clear(&self) -> bool {
        let keys = [
            self.keys.token.as_str(),
            self.keys.stored_at.as_str(),
            self.keys.identity.as_str(),
        ];
        match self.store.remove(&keys).await {
            Ok(()) => true,
            Err(e) => {
                self.observer
                    .storage_failure(StorageOp::Clear, &self.keys.token, &e);
                false
            }
        }
    }

    pub async fn store_identity(&self, identity: &Identity) -> bool {
        let encoded = match serde_json::to_string(identity) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.observer.storage_failure(
                    StorageOp::Write,
                    &self.keys.identity,
                    &SignalError::from(e),
                );
                return false;
            }
        };
        match self.store.set(&self.keys.identity, &encoded).await {
            Ok(()) => true,
            Err(e) => {
                self.observer
                    .storage_failure(StorageOp::Write, &self.keys.identity, &e);
                false
            }
        }
    }

    pub async fn identity(&self) -> Option<Identity> {
        let raw = self.read(&self.keys.identity).await?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                self.observer.storage_failure(
                    StorageOp::Decode,
                    &self.keys.identity,
                    &SignalError::from(e),
                );
                None
            }
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                self.observer.storage_failure(StorageOp::Read, key, &e);
                None
            }
        }
    }

    async fn read_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.read(&self.keys.stored_at).await?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                self.observer.storage_failure(
                    StorageOp::Decode,
                    &self.keys.stored_at,
                    &SignalError::Storage {
                        source: Box::new(e),
                    },
                );
                None
            }
        }
    }
}

/// Converts configured minutes into a window, clamped to what validation
/// accepts so an unvalidated config cannot overflow.
fn validity_window(minutes: i64) -> TimeDelta {
    TimeDelta::try_minutes(minutes.clamp(1, MAX_VALIDITY_MINUTES)).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use secrecy::ExposeSecret;
    use signalbox_core::TracingObserver;

    use super::*;
    use crate::MemoryStore;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(t: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(t)))
        }

        fn advance(&self, by: TimeDelta) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn session(store: Arc<MemoryStore>, clock: Arc<FixedClock>) -> SessionStore {
        SessionStore::from_config(
            store,
            &StorageConfig::default(),
            &SessionConfig::default(),
            clock,
            Arc::new(TracingObserver),
        )
    }

    #[tokio::test]
    async fn fresh_credential_loads() {
        let clock = FixedClock::at(t0());
        let store = session(Arc::new(MemoryStore::new()), clock.clone());
        assert!(store.store("tok-1").await);

        clock.advance(TimeDelta::minutes(10));
        let credential = store.load().await.expect("credential should be valid");
        assert_eq!(credential.token.expose_secret(), "tok-1");
        assert_eq!(credential.stored_at, t0());
    }

    #[tokio::test]
    async fn expired_credential_reads_none_and_clears_storage() {
        let clock = FixedClock::at(t0());
        let backing = Arc::new(MemoryStore::new());
        let store = session(backing.clone(), clock.clone());
        store.store("tok-1").await;
        store
            .store_identity(&Identity {
                id: "u-1".into(),
                name: Some("Jana".into()),
                email: Some("jana@example.com".into()),
            })
            .await;

        clock.advance(TimeDelta::minutes(56));
        assert!(store.load().await.is_none());

        let keys = SessionKeys::from(&StorageConfig::default());
        assert_eq!(backing.get(&keys.token).await.unwrap(), None);
        assert_eq!(backing.get(&keys.stored_at).await.unwrap(), None);
        assert_eq!(backing.get(&keys.identity).await.unwrap(), None);
    }

    #[tokio::test]
    async fn credential_expires_exactly_at_window_edge() {
        let clock = FixedClock::at(t0());
        let store = session(Arc::new(MemoryStore::new()), clock.clone());
        store.store("tok").await;

        clock.advance(TimeDelta::minutes(55) - TimeDelta::seconds(1));
        assert!(store.load().await.is_some());
        clock.advance(TimeDelta::seconds(1));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn out_of_range_validity_is_clamped() {
        assert_eq!(validity_window(i64::MAX), TimeDelta::minutes(MAX_VALIDITY_MINUTES));
        assert_eq!(validity_window(-5), TimeDelta::minutes(1));

        let clock = FixedClock::at(t0());
        let store = SessionStore::from_config(
            Arc::new(MemoryStore::new()),
            &StorageConfig::default(),
            &SessionConfig {
                validity_minutes: i64::MAX,
            },
            clock.clone(),
            Arc::new(TracingObserver),
        );
        store.store("tok").await;
        assert_eq!(
            store.expires_at().await,
            Some(t0() + TimeDelta::minutes(MAX_VALIDITY_MINUTES))
        );
    }

    #[tokio::test]
    async fn token_without_timestamp_is_discarded() {
        let clock = FixedClock::at(t0());
        let backing = Arc::new(MemoryStore::new());
        let keys = SessionKeys::from(&StorageConfig::default());
        backing.set(&keys.token, "orphan").await.unwrap();

        let store = session(backing.clone(), clock);
        assert!(store.load().await.is_none());
        assert_eq!(backing.get(&keys.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expires_at_reports_window_end() {
        let clock = FixedClock::at(t0());
        let store = session(Arc::new(MemoryStore::new()), clock);
        assert_eq!(store.expires_at().await, None);
        store.store("tok").await;
        assert_eq!(store.expires_at().await, Some(t0() + TimeDelta::minutes(55)));
    }

    #[tokio::test]
    async fn identity_round_trips() {
        let store = session(Arc::new(MemoryStore::new()), FixedClock::at(t0()));
        assert_eq!(store.identity().await, None);
        let identity = Identity {
            id: "u-1".into(),
            name: None,
            email: Some("ops@example.com".into()),
        };
        store.store_identity(&identity).await;
        assert_eq!(store.identity().await, Some(identity));
    }
}

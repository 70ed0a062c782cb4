// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide wiring of storage, transport, and sync components.

use std::sync::Arc;

use signalbox_capture::{CaptureDeps, CaptureMachine};
use signalbox_client::{HttpTransport, WsFeedSource};
use signalbox_config::SignalboxConfig;
use signalbox_core::{
    Clock, FeedSource, Identity, KeyValueStore, SignalError, SignalTransport, StorageObserver,
    SystemClock, TracingObserver,
};
use signalbox_storage::{PersistedQueue, SessionStore, SqliteStore};
use signalbox_sync::{ConnectivityMonitor, LocalSignals, Reconciler};
use tracing::{debug, info};

/// Everything a command needs, opened once per process.
pub struct App {
    pub config: Arc<SignalboxConfig>,
    pub queue: Arc<PersistedQueue>,
    pub session: Arc<SessionStore>,
    pub http: HttpTransport,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub local: Arc<LocalSignals>,
    pub reconciler: Arc<Reconciler>,
    store: Arc<SqliteStore>,
    transport: Arc<dyn SignalTransport>,
    clock: Arc<dyn Clock>,
}

impl App {
    /// Opens the local database and builds the component graph.
    ///
    /// Connectivity starts out offline until the first probe says otherwise.
    pub async fn open(config: SignalboxConfig) -> Result<Self, SignalError> {
        let config = Arc::new(config);
        let store = Arc::new(SqliteStore::open(&config.storage).await?);
        let kv: Arc<dyn KeyValueStore> = store.clone();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let observer: Arc<dyn StorageObserver> = Arc::new(TracingObserver);

        let queue = Arc::new(PersistedQueue::new(
            Arc::clone(&kv),
            config.storage.queue_key.clone(),
            Arc::clone(&clock),
            Arc::clone(&observer),
        ));
        let session = Arc::new(SessionStore::from_config(
            kv,
            &config.storage,
            &config.session,
            Arc::clone(&clock),
            observer,
        ));

        let http = HttpTransport::new(&config.api)?;
        let transport: Arc<dyn SignalTransport> = Arc::new(http.clone());
        let connectivity = Arc::new(ConnectivityMonitor::new(false));
        let local = Arc::new(LocalSignals::new());
        let reconciler = Arc::new(
            Reconciler::new(
                Arc::clone(&queue),
                Arc::clone(&transport),
                connectivity.clone(),
            )
            .with_local(Arc::clone(&local)),
        );

        debug!(database = %config.storage.database_path, "signalbox components ready");
        Ok(Self {
            config,
            queue,
            session,
            http,
            connectivity,
            local,
            reconciler,
            store,
            transport,
            clock,
        })
    }

    /// Probes the API once and records the answer in the monitor.
    pub async fn refresh_connectivity(&self) -> bool {
        let online = self.http.probe_online().await;
        self.connectivity.set_online(online);
        online
    }

    pub fn capture_machine(&self) -> Arc<CaptureMachine> {
        let deps = CaptureDeps {
            transport: Arc::clone(&self.transport),
            queue: Arc::clone(&self.queue),
            session: Arc::clone(&self.session),
            connectivity: self.connectivity.clone(),
            local: Arc::clone(&self.local),
            clock: Arc::clone(&self.clock),
        };
        CaptureMachine::new(deps, Arc::clone(&self.config))
    }

    /// The live feed, if `api.feed_url` is configured.
    pub fn feed(&self) -> Option<Arc<dyn FeedSource>> {
        self.config.api.feed_url.as_ref().map(|url| {
            Arc::new(WsFeedSource::new(
                self.http.clone(),
                url.clone(),
                self.config.sync.page_size,
            )) as Arc<dyn FeedSource>
        })
    }

    /// Stores the credential and identity. Fails if either write was lost.
    pub async fn login(&self, token: &str, identity: &Identity) -> Result<(), SignalError> {
        if !self.session.store(token).await {
            return Err(SignalError::Internal("could not persist credential".into()));
        }
        if !self.session.store_identity(identity).await {
            return Err(SignalError::Internal("could not persist identity".into()));
        }
        info!(user_id = %identity.id, "signed in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), SignalError> {
        if self.session.clear().await {
            info!("signed out");
            Ok(())
        } else {
            Err(SignalError::Internal("could not clear stored session".into()))
        }
    }

    /// Checkpoints and closes the database.
    pub async fn close(&self) -> Result<(), SignalError> {
        self.store.database().close().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use signalbox_capture::{CaptureOutcome, QueueReason};

    /// A config pointing at a temporary database and an unroutable API.
    pub(crate) fn test_config(dir: &tempfile::TempDir) -> SignalboxConfig {
        let mut config = SignalboxConfig::default();
        config.storage.database_path = dir
            .path()
            .join("signalbox.db")
            .to_string_lossy()
            .into_owned();
        config.api.base_url = "http://127.0.0.1:9".into();
        config.capture.min_processing_ms = 0;
        config.capture.success_display_ms = 0;
        config
    }

    fn identity() -> Identity {
        Identity {
            id: "u-1".into(),
            name: Some("Jana".into()),
            email: Some("jana@example.cz".into()),
        }
    }

    #[tokio::test]
    async fn login_then_logout() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(test_config(&dir)).await.unwrap();

        app.login("tok-1", &identity()).await.unwrap();
        assert!(app.session.load().await.is_some());
        assert_eq!(app.session.identity().await, Some(identity()));

        app.logout().await.unwrap();
        assert!(app.session.load().await.is_none());
        assert!(app.session.identity().await.is_none());
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn offline_capture_lands_in_the_queue_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let app = App::open(test_config(&dir)).await.unwrap();
            app.login("tok-1", &identity()).await.unwrap();

            let machine = app.capture_machine();
            assert!(machine.begin());
            assert!(machine.set_title("Chybí objednávkový lístek"));
            let outcome = machine.submit().await.unwrap();
            assert!(matches!(
                outcome,
                CaptureOutcome::Queued {
                    reason: QueueReason::Offline,
                    persisted: true,
                    ..
                }
            ));
            app.close().await.unwrap();
        }

        let app = App::open(test_config(&dir)).await.unwrap();
        let entries = app.queue.read_all().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].signal.title, "Chybí objednávkový lístek");
        assert_eq!(entries[0].signal.author_id.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn feed_only_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(test_config(&dir)).await.unwrap();
        assert!(app.feed().is_none());

        let mut config = test_config(&dir);
        config.api.feed_url = Some("ws://127.0.0.1:9/feed".into());
        let app = App::open(config).await.unwrap();
        assert!(app.feed().is_some());
    }
}

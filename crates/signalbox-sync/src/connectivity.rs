// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Online/offline tracking.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use signalbox_core::Connectivity;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Current connectivity, observable through a `watch` channel so the
/// reconciler can react to offline to online edges.
pub struct ConnectivityMonitor {
    online: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (online, _) = watch::channel(initially_online);
        Self { online }
    }

    /// Records the latest observation. Subscribers are only woken when the
    /// state actually changes.
    pub fn set_online(&self, online: bool) {
        let changed = self.online.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "connectivity changed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    /// Runs `probe` every `interval` and feeds the result into the monitor
    /// until `cancel` fires.
    pub fn spawn_probe<P, Fut>(
        self: &Arc<Self>,
        interval: Duration,
        probe: P,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        P: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send,
    {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let online = probe().await;
                        debug!(online, "connectivity probe");
                        monitor.set_online(online);
                    }
                    _ = cancel.cancelled() => {
                        debug!("connectivity probe shutting down");
                        break;
                    }
                }
            }
        })
    }
}

impl Connectivity for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.online.borrow()
    }
}

// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local mirror of the authoritative signal set, kept current from the live
//! feed.
//!
//! The mirror only ever holds records the feed delivered. A failed baseline
//! is retried here rather than left for the merge stage to paper over, and a
//! lost subscription is re-opened and re-baselined.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use signalbox_core::{FeedEvent, FeedSource, Signal};
use signalbox_storage::SessionStore;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct LiveMirror {
    signals: watch::Sender<Vec<Signal>>,
}

impl LiveMirror {
    pub fn new() -> Self {
        let (signals, _) = watch::channel(Vec::new());
        Self { signals }
    }

    /// Applies one change notification.
    ///
    /// Inserts are prepended, or replace in place when the id is already
    /// mirrored. Updates and deletes for unknown ids are ignored.
    pub fn apply(&self, event: FeedEvent) {
        match event {
            FeedEvent::Insert(signal) => self.signals.send_modify(|signals| {
                match signals.iter_mut().find(|s| s.id == signal.id) {
                    Some(existing) => *existing = signal,
                    None => signals.insert(0, signal),
                }
            }),
            FeedEvent::Update(signal) => {
                let id = signal.id.clone();
                let applied = self.signals.send_if_modified(|signals| {
                    match signals.iter_mut().find(|s| s.id == signal.id) {
                        Some(existing) => {
                            *existing = signal;
                            true
                        }
                        None => false,
                    }
                });
                if !applied {
                    debug!(signal_id = %id, "update for unmirrored signal ignored");
                }
            }
            FeedEvent::Delete(id) => {
                let removed = self.signals.send_if_modified(|signals| {
                    let before = signals.len();
                    signals.retain(|s| s.id != id);
                    signals.len() != before
                });
                if !removed {
                    debug!(signal_id = %id, "delete for unmirrored signal ignored");
                }
            }
        }
    }

    /// Replaces the whole mirror with a fresh baseline.
    pub fn replace_all(&self, signals: Vec<Signal>) {
        self.signals.send_replace(signals);
    }

    pub fn snapshot(&self) -> Vec<Signal> {
        self.signals.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Signal>> {
        self.signals.subscribe()
    }

    /// Keeps the mirror in sync until `cancel` fires.
    ///
    /// Each cycle subscribes first and then loads the baseline, so changes
    /// made while the baseline is in flight are buffered on the stream and
    /// applied on top of it. Any failure waits `retry` before the next cycle.
    pub async fn run(
        &self,
        feed: Arc<dyn FeedSource>,
        session: Arc<SessionStore>,
        retry: Duration,
        cancel: CancellationToken,
    ) {
        info!("live mirror started");
        while !cancel.is_cancelled() {
            let Some(credential) = session.load().await else {
                warn!("no valid credential, live feed waiting");
                wait_or_cancel(retry, &cancel).await;
                continue;
            };

            let mut events = match feed.subscribe(&credential).await {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "live feed subscribe failed, retrying");
                    wait_or_cancel(retry, &cancel).await;
                    continue;
                }
            };

            match feed.baseline(&credential).await {
                Ok(signals) => {
                    info!(count = signals.len(), "live feed baseline loaded");
                    self.replace_all(signals);
                }
                Err(e) => {
                    warn!(error = %e, "live feed baseline failed, retrying");
                    wait_or_cancel(retry, &cancel).await;
                    continue;
                }
            }

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("live mirror shutting down");
                        return;
                    }
                    item = events.next() => match item {
                        Some(Ok(event)) => self.apply(event),
                        Some(Err(e)) => {
                            warn!(error = %e, "live feed lost, resubscribing");
                            break;
                        }
                        None => {
                            info!("live feed ended, resubscribing");
                            break;
                        }
                    }
                }
            }
            wait_or_cancel(retry, &cancel).await;
        }
        info!("live mirror shutting down");
    }
}

impl Default for LiveMirror {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_or_cancel(delay: Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancel.cancelled() => {}
    }
}

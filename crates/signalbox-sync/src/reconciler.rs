// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue reconciler: resends persisted signals once the network is back.
//!
//! A drain walks a snapshot of the queue in enqueue order and sends each
//! entry once. Delivered entries and permanently rejected ones are then
//! removed in a single settle step; retryable failures stay in place. There
//! is no retry cap and no backoff: every drain retries every remaining entry.

use std::collections::HashSet;
use std::sync::Arc;

use signalbox_core::{Connectivity, Credential, SignalId, SignalTransport};
use signalbox_storage::{PersistedQueue, SessionStore};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::LocalSignals;

/// Why a drain did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    /// Another drain was already running.
    InProgress,
}

/// Outcome of one drain call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub attempted: usize,
    pub delivered: usize,
    /// Retryable failures, left in the queue.
    pub retained: usize,
    /// Permanent rejections, dropped from the queue.
    pub rejected: usize,
    /// Queue length after settling, including entries added mid-drain.
    pub remaining: usize,
    pub skipped: Option<SkipReason>,
}

impl DrainReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

pub struct Reconciler {
    queue: Arc<PersistedQueue>,
    transport: Arc<dyn SignalTransport>,
    connectivity: Arc<dyn Connectivity>,
    /// Optimistic copies to drop once their queue entry is resolved.
    local: Option<Arc<LocalSignals>>,
    running: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        queue: Arc<PersistedQueue>,
        transport: Arc<dyn SignalTransport>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            queue,
            transport,
            connectivity,
            local: None,
            running: Mutex::new(()),
        }
    }

    /// Removes delivered and rejected signals from `local` after each drain,
    /// so the merged view falls back to the server's copy.
    pub fn with_local(mut self, local: Arc<LocalSignals>) -> Self {
        self.local = Some(local);
        self
    }

    /// Attempts delivery of every queued entry.
    ///
    /// Connectivity is checked once up front. Only one drain runs at a time;
    /// an overlapping call returns a skipped report immediately.
    pub async fn drain(&self, credential: &Credential) -> DrainReport {
        if !self.connectivity.is_online() {
            debug!("offline, queue drain skipped");
            return DrainReport::skipped(SkipReason::Offline);
        }
        let Ok(_running) = self.running.try_lock() else {
            debug!("queue drain already in progress");
            return DrainReport::skipped(SkipReason::InProgress);
        };

        let entries = self.queue.read_all().await;
        if entries.is_empty() {
            return DrainReport::default();
        }

        let mut report = DrainReport::default();
        let mut resolved: HashSet<SignalId> = HashSet::new();
        for entry in entries {
            let signal = entry.into_signal();
            report.attempted += 1;
            match self.transport.submit(&signal, credential).await {
                Ok(_) => {
                    debug!(signal_id = %signal.id, "queued signal delivered");
                    metrics::counter!("signalbox_signals_delivered_total", "path" => "drain")
                        .increment(1);
                    report.delivered += 1;
                    resolved.insert(signal.id);
                }
                Err(e) if e.is_retryable() => {
                    debug!(signal_id = %signal.id, error = %e, "queued signal still undeliverable");
                    report.retained += 1;
                }
                Err(e) => {
                    warn!(
                        signal_id = %signal.id,
                        error = %e,
                        "queued signal permanently rejected, dropping"
                    );
                    metrics::counter!("signalbox_signals_rejected_total", "path" => "drain")
                        .increment(1);
                    report.rejected += 1;
                    resolved.insert(signal.id);
                }
            }
        }

        report.remaining = match self.queue.settle(&resolved).await {
            Some(remaining) => remaining,
            None => {
                warn!("queue unreadable while settling, entries left in place");
                report.retained
            }
        };
        if let Some(local) = &self.local {
            for id in &resolved {
                local.remove(id);
            }
        }
        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            retained = report.retained,
            rejected = report.rejected,
            remaining = report.remaining,
            "queue drain complete"
        );
        report
    }

    /// Drains with the session's current credential, if it has a valid one.
    pub async fn drain_with_session(&self, session: &SessionStore) -> Option<DrainReport> {
        match session.load().await {
            Some(credential) => Some(self.drain(&credential).await),
            None => {
                info!("no valid credential, queue drain deferred");
                None
            }
        }
    }

    /// Drains once at start and again on every offline to online edge until
    /// `cancel` fires.
    pub async fn run_on_reconnect(
        &self,
        session: Arc<SessionStore>,
        mut online: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) {
        let mut was_online = *online.borrow_and_update();
        self.drain_with_session(&session).await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("reconciler shutting down");
                    break;
                }
                changed = online.changed() => {
                    if changed.is_err() {
                        debug!("connectivity source closed, reconciler stopping");
                        break;
                    }
                    let now_online = *online.borrow_and_update();
                    if now_online && !was_online {
                        info!("connectivity regained, draining queue");
                        self.drain_with_session(&session).await;
                    }
                    was_online = now_online;
                }
            }
        }
    }
}

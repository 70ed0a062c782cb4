// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signals created or edited on this client in the current session.

use signalbox_core::{Signal, SignalId};
use tokio::sync::watch;

/// The local side of the merge.
///
/// Capture pushes new signals here optimistically, before delivery is known,
/// so they show up in the merged view at once. Subscribers are notified on
/// every change.
pub struct LocalSignals {
    signals: watch::Sender<Vec<Signal>>,
}

impl LocalSignals {
    pub fn new() -> Self {
        let (signals, _) = watch::channel(Vec::new());
        Self { signals }
    }

    pub fn push(&self, signal: Signal) {
        self.signals.send_modify(|signals| signals.push(signal));
    }

    /// Replaces the signal with the same id in place, or appends it.
    pub fn upsert(&self, signal: Signal) {
        self.signals.send_modify(|signals| {
            match signals.iter_mut().find(|existing| existing.id == signal.id) {
                Some(existing) => *existing = signal,
                None => signals.push(signal),
            }
        });
    }

    /// Returns whether a signal was removed.
    pub fn remove(&self, id: &SignalId) -> bool {
        self.signals.send_if_modified(|signals| {
            let before = signals.len();
            signals.retain(|signal| &signal.id != id);
            signals.len() != before
        })
    }

    pub fn snapshot(&self) -> Vec<Signal> {
        self.signals.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Signal>> {
        self.signals.subscribe()
    }
}

impl Default for LocalSignals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn upsert_replaces_in_place() {
        let local = LocalSignals::new();
        let a = Signal::capture("A", Utc::now());
        let b = Signal::capture("B", Utc::now());
        local.push(a.clone());
        local.push(b.clone());

        let mut edited = a.clone();
        edited.title = "A, edited".into();
        local.upsert(edited.clone());

        assert_eq!(local.snapshot(), vec![edited, b]);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let local = LocalSignals::new();
        let a = Signal::capture("A", Utc::now());
        local.push(a.clone());
        assert!(local.remove(&a.id));
        assert!(!local.remove(&a.id));
        assert!(local.snapshot().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_pushes() {
        let local = LocalSignals::new();
        let mut rx = local.subscribe();
        local.push(Signal::capture("A", Utc::now()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}

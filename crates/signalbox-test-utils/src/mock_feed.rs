// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted live feed.
//!
//! Each `baseline` call pops the next scripted baseline (repeating the last
//! successful one once the script runs out). Each `subscribe` call pops the
//! next [`Subscription`]; with none left, the subscription stays open and
//! silent.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use signalbox_core::{Credential, DeliveryError, FeedEvent, FeedSource, FeedStream, Signal};

use crate::mock_transport::MockOutcome;

/// One scripted subscription.
pub enum Subscription {
    /// Delivers the events, then ends as if the connection dropped.
    Finite(Vec<FeedEvent>),
    /// Delivers whatever the test pushes through the paired sender.
    Live(mpsc::UnboundedReceiver<FeedEvent>),
    /// The subscribe call itself fails.
    Fail(MockOutcome),
}

pub struct ScriptedFeed {
    baselines: Mutex<VecDeque<Result<Vec<Signal>, MockOutcome>>>,
    last_baseline: Mutex<Vec<Signal>>,
    subscriptions: Mutex<VecDeque<Subscription>>,
    baseline_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            baselines: Mutex::new(VecDeque::new()),
            last_baseline: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(VecDeque::new()),
            baseline_calls: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
        })
    }

    pub async fn push_baseline(&self, signals: Vec<Signal>) {
        self.baselines.lock().await.push_back(Ok(signals));
    }

    pub async fn push_baseline_failure(&self, outcome: MockOutcome) {
        self.baselines.lock().await.push_back(Err(outcome));
    }

    pub async fn push_subscription(&self, subscription: Subscription) {
        self.subscriptions.lock().await.push_back(subscription);
    }

    /// Scripts a live subscription and returns its event sender.
    pub async fn push_live(&self) -> mpsc::UnboundedSender<FeedEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.push_subscription(Subscription::Live(rx)).await;
        tx
    }

    pub fn baseline_calls(&self) -> usize {
        self.baseline_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }
}

fn failure(outcome: &MockOutcome) -> DeliveryError {
    outcome.to_error().unwrap_or_else(|| DeliveryError::Transport {
        message: "scripted feed failure".into(),
        source: None,
    })
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn baseline(&self, _credential: &Credential) -> Result<Vec<Signal>, DeliveryError> {
        self.baseline_calls.fetch_add(1, Ordering::SeqCst);
        match self.baselines.lock().await.pop_front() {
            Some(Ok(signals)) => {
                *self.last_baseline.lock().await = signals.clone();
                Ok(signals)
            }
            Some(Err(outcome)) => Err(failure(&outcome)),
            None => Ok(self.last_baseline.lock().await.clone()),
        }
    }

    async fn subscribe(&self, _credential: &Credential) -> Result<FeedStream, DeliveryError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        match self.subscriptions.lock().await.pop_front() {
            Some(Subscription::Finite(events)) => Ok(Box::pin(stream::iter(
                events.into_iter().map(Ok::<_, DeliveryError>),
            ))),
            Some(Subscription::Live(rx)) => Ok(Box::pin(rx.map(Ok::<_, DeliveryError>))),
            Some(Subscription::Fail(outcome)) => Err(failure(&outcome)),
            None => Ok(Box::pin(stream::pending::<Result<FeedEvent, DeliveryError>>())),
        }
    }
}

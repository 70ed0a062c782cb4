// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock signal transport for deterministic delivery tests.
//!
//! Outcomes are resolved per submission in this order: a sticky outcome
//! registered for the signal's id, then the next scripted outcome from the
//! FIFO queue, then acceptance. Accepted submissions are upserted by id into
//! a server-side record set that `fetch` pages over.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use signalbox_core::{
    Credential, DeliveryError, FetchQuery, Signal, SignalId, SignalTransport, SubmitAck,
};

/// A scripted result for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Accept,
    /// Fails as if the network were unreachable.
    TransportFailure,
    Reject { status: u16, message: String },
}

impl MockOutcome {
    pub fn reject(status: u16, message: impl Into<String>) -> Self {
        Self::Reject {
            status,
            message: message.into(),
        }
    }

    /// Builds the error this outcome stands for, or `None` for acceptance.
    pub fn to_error(&self) -> Option<DeliveryError> {
        match self {
            Self::Accept => None,
            Self::TransportFailure => Some(DeliveryError::Transport {
                message: "mock transport: network unreachable".into(),
                source: None,
            }),
            Self::Reject { status, message } => Some(DeliveryError::Rejected {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// A mock [`SignalTransport`].
pub struct MockTransport {
    sticky: Arc<Mutex<HashMap<SignalId, MockOutcome>>>,
    scripted: Arc<Mutex<VecDeque<MockOutcome>>>,
    submitted: Arc<Mutex<Vec<Signal>>>,
    server: Arc<Mutex<BTreeMap<SignalId, Signal>>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// A transport that accepts everything immediately.
    pub fn new() -> Self {
        Self {
            sticky: Arc::new(Mutex::new(HashMap::new())),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            submitted: Arc::new(Mutex::new(Vec::new())),
            server: Arc::new(Mutex::new(BTreeMap::new())),
            latency: None,
        }
    }

    /// Delays every call by `latency` (use with a paused tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every submission of `id` resolves to `outcome` until changed.
    pub async fn set_outcome_for(&self, id: &SignalId, outcome: MockOutcome) {
        self.sticky.lock().await.insert(id.clone(), outcome);
    }

    /// Queues an outcome for the next submission without a sticky outcome.
    pub async fn push_outcome(&self, outcome: MockOutcome) {
        self.scripted.lock().await.push_back(outcome);
    }

    /// Seeds the server-side record set.
    pub async fn seed_server(&self, signals: Vec<Signal>) {
        let mut server = self.server.lock().await;
        for signal in signals {
            server.insert(signal.id.clone(), signal);
        }
    }

    /// Every signal passed to `submit`, in call order, including failures.
    pub async fn submitted(&self) -> Vec<Signal> {
        self.submitted.lock().await.clone()
    }

    pub async fn submit_count(&self) -> usize {
        self.submitted.lock().await.len()
    }

    /// How many times `submit` was called for `id`.
    pub async fn submit_count_for(&self, id: &SignalId) -> usize {
        self.submitted
            .lock()
            .await
            .iter()
            .filter(|s| &s.id == id)
            .count()
    }

    /// The accepted records, one per id, as the server would hold them.
    pub async fn server_records(&self) -> Vec<Signal> {
        self.server.lock().await.values().cloned().collect()
    }

    async fn resolve(&self, id: &SignalId) -> MockOutcome {
        if let Some(outcome) = self.sticky.lock().await.get(id) {
            return outcome.clone();
        }
        self.scripted
            .lock()
            .await
            .pop_front()
            .unwrap_or(MockOutcome::Accept)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalTransport for MockTransport {
    async fn submit(
        &self,
        signal: &Signal,
        _credential: &Credential,
    ) -> Result<SubmitAck, DeliveryError> {
        self.submitted.lock().await.push(signal.clone());
        let outcome = self.resolve(&signal.id).await;
        self.simulate_latency().await;
        if let Some(err) = outcome.to_error() {
            return Err(err);
        }
        self.server
            .lock()
            .await
            .insert(signal.id.clone(), signal.clone());
        Ok(SubmitAck(serde_json::json!({ "signal": signal })))
    }

    async fn fetch(
        &self,
        query: &FetchQuery,
        _credential: &Credential,
    ) -> Result<Vec<Signal>, DeliveryError> {
        self.simulate_latency().await;
        let mut records: Vec<Signal> = self
            .server
            .lock()
            .await
            .values()
            .filter(|s| {
                query
                    .author_email
                    .as_ref()
                    .is_none_or(|email| s.author_email.as_ref() == Some(email))
            })
            .filter(|s| query.status.is_none_or(|status| s.status == status))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.display_time().cmp(&a.display_time()));

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }
}

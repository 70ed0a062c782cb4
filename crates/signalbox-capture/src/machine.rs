// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The capture flow: collects input, builds the signal, and makes it durable
//! on the server or in the local queue.

use std::sync::Arc;
use std::time::Duration;

use signalbox_config::SignalboxConfig;
use signalbox_core::{
    Clock, Connectivity, DeliveryError, Identity, Priority, Signal, SignalError, SignalTransport,
};
use signalbox_storage::{PersistedQueue, SessionStore};
use signalbox_sync::LocalSignals;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::state::{CaptureOutcome, CaptureState, Draft, QueueReason};

/// Collaborators the capture flow drives.
pub struct CaptureDeps {
    pub transport: Arc<dyn SignalTransport>,
    pub queue: Arc<PersistedQueue>,
    pub session: Arc<SessionStore>,
    pub connectivity: Arc<dyn Connectivity>,
    pub local: Arc<LocalSignals>,
    pub clock: Arc<dyn Clock>,
}

/// Observable capture state machine.
///
/// State changes are published on a `watch` channel. Every method that is
/// called in the wrong state leaves the state untouched and reports so.
pub struct CaptureMachine {
    state: watch::Sender<CaptureState>,
    deps: CaptureDeps,
    config: Arc<SignalboxConfig>,
}

impl CaptureMachine {
    pub fn new(deps: CaptureDeps, config: Arc<SignalboxConfig>) -> Arc<Self> {
        let (state, _) = watch::channel(CaptureState::Idle);
        Arc::new(Self {
            state,
            deps,
            config,
        })
    }

    pub fn state(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    /// `Idle -> Capturing`.
    pub fn begin(&self) -> bool {
        self.transition(|state| match state {
            CaptureState::Idle => Some(CaptureState::Capturing {
                draft: Draft::default(),
            }),
            _ => None,
        })
    }

    /// `Capturing -> Idle`, discarding input.
    pub fn cancel(&self) -> bool {
        self.transition(|state| match state {
            CaptureState::Capturing { .. } => Some(CaptureState::Idle),
            _ => None,
        })
    }

    pub fn set_title(&self, title: impl Into<String>) -> bool {
        let title = title.into();
        self.edit(|draft| draft.title = title)
    }

    pub fn set_body(&self, body: impl Into<String>) -> bool {
        let body = body.into();
        self.edit(|draft| draft.body = body)
    }

    pub fn set_priority(&self, priority: Option<Priority>) -> bool {
        self.edit(|draft| draft.priority = priority)
    }

    /// Adds the restaurant to the selection, or removes it if already there.
    pub fn toggle_restaurant(&self, restaurant_id: impl Into<String>) -> bool {
        let restaurant_id = restaurant_id.into();
        self.edit(|draft| {
            if let Some(pos) = draft.restaurant_ids.iter().position(|r| *r == restaurant_id) {
                draft.restaurant_ids.remove(pos);
            } else {
                draft.restaurant_ids.push(restaurant_id);
            }
        })
    }

    /// `Error -> Capturing`, keeping the rejected input for correction.
    pub fn dismiss_error(&self) -> bool {
        self.transition(|state| match state {
            CaptureState::Error { draft, .. } => Some(CaptureState::Capturing {
                draft: draft.clone(),
            }),
            _ => None,
        })
    }

    /// `Success -> Idle` right away, without waiting out the display time.
    pub fn finish(&self) -> bool {
        self.transition(|state| match state {
            CaptureState::Success { .. } => Some(CaptureState::Idle),
            _ => None,
        })
    }

    /// Submits the current draft.
    ///
    /// A blank title is rejected with [`SignalError::Validation`] and the
    /// machine stays in `Capturing`. Otherwise the machine holds `Sending`
    /// until both the delivery attempt and the minimum processing delay have
    /// completed, then enters `Success` and schedules the automatic return to
    /// `Idle`. Only a permanent server rejection ends in `Error`.
    pub async fn submit(self: &Arc<Self>) -> Result<CaptureOutcome, SignalError> {
        let identity = self.deps.session.identity().await;

        // Claim the draft and enter `Sending` in one step so a second submit
        // cannot send the same input twice.
        let mut claimed: Option<(Draft, Signal)> = None;
        self.state.send_if_modified(|state| match state {
            CaptureState::Capturing { draft } if !draft.title.trim().is_empty() => {
                let draft = draft.clone();
                let signal = self.build_signal(&draft, identity.as_ref());
                *state = CaptureState::Sending {
                    draft: draft.clone(),
                    signal_id: signal.id.clone(),
                };
                claimed = Some((draft, signal));
                true
            }
            _ => false,
        });
        let Some((draft, signal)) = claimed else {
            return Err(match self.state() {
                CaptureState::Capturing { .. } => {
                    debug!("submit with blank title ignored");
                    SignalError::Validation("title is required".into())
                }
                other => SignalError::Validation(format!("cannot submit while {other}")),
            });
        };

        let signal_id = signal.id.clone();
        self.deps.local.push(signal.clone());

        let min_processing = Duration::from_millis(self.config.capture.min_processing_ms);
        let (result, ()) = tokio::join!(
            self.deliver(signal),
            tokio::time::sleep(min_processing)
        );

        match result {
            Ok(outcome) => {
                self.state.send_replace(CaptureState::Success {
                    outcome: outcome.clone(),
                });
                self.schedule_reset(outcome.clone());
                Ok(outcome)
            }
            Err(e) => {
                warn!(signal_id = %signal_id, error = %e, "signal rejected by server");
                metrics::counter!("signalbox_signals_rejected_total", "path" => "capture")
                    .increment(1);
                self.deps.local.remove(&signal_id);
                let message = match &e {
                    DeliveryError::Rejected { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                self.state
                    .send_replace(CaptureState::Error { draft, message });
                Err(SignalError::Delivery(e))
            }
        }
    }

    fn build_signal(&self, draft: &Draft, identity: Option<&Identity>) -> Signal {
        let capture = &self.config.capture;
        let title: String = draft.title.trim().chars().take(capture.title_max_chars).collect();

        let mut signal = Signal::capture(title, self.deps.clock.now());
        let body = draft.body.trim();
        signal.body = (!body.is_empty()).then(|| body.to_string());
        signal.source = capture.default_source.clone();
        signal.priority = draft.priority;
        signal.restaurant_ids = draft.restaurant_ids.clone();

        if let Some(identity) = identity {
            let brand_ids = identity
                .email
                .as_deref()
                .map(|email| self.config.brand_ids_for(email))
                .unwrap_or_default();
            signal = signal.with_author(identity, brand_ids);
        }
        signal
    }

    /// Sends once, or queues. Returns an error only for permanent rejections.
    async fn deliver(&self, signal: Signal) -> Result<CaptureOutcome, DeliveryError> {
        if !self.deps.connectivity.is_online() {
            return Ok(self.enqueue(signal, QueueReason::Offline).await);
        }
        let Some(credential) = self.deps.session.load().await else {
            return Ok(self.enqueue(signal, QueueReason::NoCredential).await);
        };

        match self.deps.transport.submit(&signal, &credential).await {
            Ok(_) => {
                info!(signal_id = %signal.id, "signal delivered");
                metrics::counter!("signalbox_signals_delivered_total", "path" => "capture")
                    .increment(1);
                Ok(CaptureOutcome::Delivered { id: signal.id })
            }
            Err(e) if e.is_retryable() => {
                debug!(signal_id = %signal.id, error = %e, "delivery failed, queueing");
                let reason = match e.status() {
                    Some(status) => QueueReason::Unavailable { status },
                    None => QueueReason::Transport,
                };
                Ok(self.enqueue(signal, reason).await)
            }
            Err(e) => Err(e),
        }
    }

    async fn enqueue(&self, signal: Signal, reason: QueueReason) -> CaptureOutcome {
        let id = signal.id.clone();
        let persisted = self.deps.queue.enqueue(signal).await;
        let label: &'static str = reason.into();
        info!(signal_id = %id, reason = label, persisted, "signal queued for later delivery");
        metrics::counter!("signalbox_signals_queued_total", "reason" => label).increment(1);
        CaptureOutcome::Queued {
            id,
            reason,
            persisted,
        }
    }

    fn schedule_reset(self: &Arc<Self>, outcome: CaptureOutcome) {
        let machine = Arc::clone(self);
        let display = Duration::from_millis(self.config.capture.success_display_ms);
        tokio::spawn(async move {
            tokio::time::sleep(display).await;
            machine.transition(|state| match state {
                CaptureState::Success { outcome: shown } if *shown == outcome => {
                    Some(CaptureState::Idle)
                }
                _ => None,
            });
        });
    }

    fn edit(&self, change: impl FnOnce(&mut Draft)) -> bool {
        self.state.send_if_modified(|state| match state {
            CaptureState::Capturing { draft } => {
                change(draft);
                true
            }
            _ => false,
        })
    }

    /// Applies `next` if it yields a new state. Returns whether it did.
    fn transition(&self, next: impl FnOnce(&CaptureState) -> Option<CaptureState>) -> bool {
        let changed = self.state.send_if_modified(|state| match next(state) {
            Some(new_state) => {
                debug!(from = %state, to = %new_state, "capture state change");
                *state = new_state;
                true
            }
            None => false,
        });
        if !changed {
            debug!(state = %*self.state.borrow(), "capture transition not allowed");
        }
        changed
    }
}

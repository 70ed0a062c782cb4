// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capture states and outcomes.

use signalbox_core::{Priority, SignalId};
use strum::IntoStaticStr;

/// User input collected while capturing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub body: String,
    pub priority: Option<Priority>,
    pub restaurant_ids: Vec<String>,
}

/// Why a capture ended up in the local queue instead of on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum QueueReason {
    /// The runtime reported no connectivity, so no send was attempted.
    Offline,
    /// The send failed before any HTTP response.
    Transport,
    /// The server answered with a retryable status.
    Unavailable { status: u16 },
    /// No valid credential was available to send with.
    NoCredential,
}

/// How a successful capture was made durable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Delivered {
        id: SignalId,
    },
    Queued {
        id: SignalId,
        reason: QueueReason,
        /// Whether the queue write reached storage. Durability is best-effort.
        persisted: bool,
    },
}

impl CaptureOutcome {
    pub fn id(&self) -> &SignalId {
        match self {
            Self::Delivered { id } | Self::Queued { id, .. } => id,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    /// Whether the user should sign in again before the queue can drain.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Queued {
                reason: QueueReason::NoCredential | QueueReason::Unavailable { status: 401 | 403 },
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing { draft: Draft },
    Sending { draft: Draft, signal_id: SignalId },
    Success { outcome: CaptureOutcome },
    /// The server rejected the payload. Input is kept for correction.
    Error { draft: Draft, message: String },
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing { .. } => "capturing",
            Self::Sending { .. } => "sending",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            Self::Capturing { draft } | Self::Sending { draft, .. } | Self::Error { draft, .. } => {
                Some(draft)
            }
            Self::Idle | Self::Success { .. } => None,
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quick-capture state machine.
//!
//! `Idle -> Capturing -> Sending -> Success -> Idle`, with `Error` reachable
//! from `Sending` only when the server rejects the payload itself. Network
//! trouble never surfaces here: the signal is queued and the user sees
//! success.

pub mod machine;
pub mod state;

pub use machine::{CaptureDeps, CaptureMachine};
pub use state::{CaptureOutcome, CaptureState, Draft, QueueReason};

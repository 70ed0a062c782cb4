// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background reconciliation for the Signalbox pipeline.
//!
//! - [`Reconciler`] drains the persisted queue through the transport.
//! - [`LiveMirror`] keeps a local copy of the server's signal set from the
//!   live feed.
//! - [`LocalSignals`] holds the signals created or edited on this client.
//! - [`merge_signals`] combines the mirror and the local set into one
//!   display list.
//! - [`ConnectivityMonitor`] tracks online state and wakes the reconciler on
//!   reconnect.

pub mod connectivity;
pub mod local;
pub mod merge;
pub mod mirror;
pub mod reconciler;

pub use connectivity::ConnectivityMonitor;
pub use local::LocalSignals;
pub use merge::merge_signals;
pub use mirror::LiveMirror;
pub use reconciler::{DrainReport, Reconciler, SkipReason};

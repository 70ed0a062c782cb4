// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Signalbox integration tests.
//!
//! Provides scripted collaborators for fast, deterministic tests without a
//! network or a database.
//!
//! # Components
//!
//! - [`MockTransport`] - Signal transport with scripted outcomes and an
//!   upsert-by-id record of accepted submissions
//! - [`ScriptedFeed`] - Live feed with scripted baselines and subscriptions
//! - [`ManualClock`], [`StaticConnectivity`] - controllable time and network state
//! - [`FailingStore`], [`RecordingObserver`] - storage fault injection

pub mod fakes;
pub mod mock_feed;
pub mod mock_transport;

pub use fakes::{FailingStore, ManualClock, RecordingObserver, StaticConnectivity};
pub use mock_feed::{ScriptedFeed, Subscription};
pub use mock_transport::{MockOutcome, MockTransport};

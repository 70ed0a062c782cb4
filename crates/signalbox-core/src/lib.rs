// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Signalbox capture pipeline.
//!
//! This crate holds the canonical signal model, the error taxonomy shared by
//! every layer, the boundary mapping for the live feed's wire schema, and the
//! traits that storage, transport, and connectivity implementations plug into.

pub mod error;
pub mod traits;
pub mod types;
pub mod wire;

pub use error::{DeliveryError, SignalError};
pub use types::{
    Credential, FeedEvent, FetchQuery, Identity, Priority, QueueEntry, Signal, SignalId,
    SignalStatus, SubmitAck, DEFAULT_SOURCE,
};

pub use traits::{
    Clock, Connectivity, FeedSource, FeedStream, KeyValueStore, SignalTransport, StorageObserver,
    StorageOp, SystemClock, TracingObserver,
};

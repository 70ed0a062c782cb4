// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits between the capture pipeline and its collaborators.
//!
//! Async traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` by the pipeline stages.

pub mod clock;
pub mod connectivity;
pub mod feed;
pub mod observer;
pub mod store;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use connectivity::Connectivity;
pub use feed::{FeedSource, FeedStream};
pub use observer::{StorageObserver, StorageOp, TracingObserver};
pub use store::KeyValueStore;
pub use transport::SignalTransport;

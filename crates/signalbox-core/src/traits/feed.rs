// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live feed source trait for near-real-time signal change notifications.

use std::pin::Pin;

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::{Credential, FeedEvent, Signal};

/// Stream of change notifications. Ends when the subscription is lost.
pub type FeedStream = Pin<Box<dyn futures_core::Stream<Item = Result<FeedEvent, DeliveryError>> + Send>>;

/// The authoritative server-side signal set, as a baseline plus changes.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    /// Fetches the full current set of signals.
    async fn baseline(&self, credential: &Credential) -> Result<Vec<Signal>, DeliveryError>;

    /// Opens a subscription delivering insert/update/delete notifications.
    async fn subscribe(&self, credential: &Credential) -> Result<FeedStream, DeliveryError>;
}

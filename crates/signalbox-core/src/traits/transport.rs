// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal transport trait: the single-attempt network primitive.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::{Credential, FetchQuery, Signal, SubmitAck};

/// Performs network calls against the signal endpoints.
///
/// Implementations never retry internally and never touch local state.
#[async_trait]
pub trait SignalTransport: Send + Sync + 'static {
    /// One bearer-authenticated submission of `signal`.
    async fn submit(
        &self,
        signal: &Signal,
        credential: &Credential,
    ) -> Result<SubmitAck, DeliveryError>;

    /// One page of the fetch-all endpoint, newest first.
    async fn fetch(
        &self,
        query: &FetchQuery,
        credential: &Credential,
    ) -> Result<Vec<Signal>, DeliveryError>;
}

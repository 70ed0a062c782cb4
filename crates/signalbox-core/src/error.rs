// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Signalbox capture pipeline.

use thiserror::Error;

/// The primary error type used across Signalbox traits and core operations.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Configuration errors (invalid values, unusable endpoints).
    #[error("configuration error: {0}")]
    Config(String),

    /// Local storage backend errors (database open, query failure, quota).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// JSON encoding or decoding of a stored or transmitted value failed.
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// A delivery attempt against the signal endpoints failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Input rejected before any network attempt.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Outcome classification of a single failed delivery attempt.
///
/// The sender produces these; callers decide what to do with them through
/// [`DeliveryError::is_retryable`] so that the capture flow and the queue
/// reconciler apply the same policy.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request never produced an HTTP response (offline, DNS, timeout,
    /// connection refused, TLS failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The server answered with success but the body could not be read as
    /// the expected shape.
    #[error("unreadable response: {message}")]
    Decode { message: String },
}

impl DeliveryError {
    /// Builds a transport error from any underlying error.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether a later resend of the same payload could succeed.
    ///
    /// Transport failures always qualify. Rejections qualify when the status
    /// points at the credential or at server availability rather than at the
    /// payload: 401, 403, 408, 425, 429 and every 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Rejected { status, .. } => {
                matches!(status, 401 | 403 | 408 | 425 | 429 | 500..=599)
            }
            Self::Decode { .. } => false,
        }
    }

    /// HTTP status of a rejection, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Decode { .. } => None,
        }
    }
}

// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical types shared by every Signalbox layer.
//!
//! [`Signal`] is the single internal shape. It serializes with camelCase keys,
//! which is also the shape of the submission and fetch-all endpoints and of the
//! persisted queue. The live feed's snake_case records are translated in
//! [`crate::wire`].

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Source tag used when a signal carries none.
pub const DEFAULT_SOURCE: &str = "quick_capture";

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

/// Opaque signal identifier, assigned once on the client before any send.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub String);

impl SignalId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle tag of a signal. New captures always start in `Inbox`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SignalStatus {
    #[default]
    Inbox,
    Triaged,
    Converted,
    Archived,
}

/// Optional urgency marker chosen at capture time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// A unit of field-captured information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: SignalId,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// When the observation happened, distinct from delivery time.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub author_brand_ids: Vec<String>,
    #[serde(default)]
    pub restaurant_ids: Vec<String>,
    #[serde(default)]
    pub theme_ids: Vec<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: SignalStatus,
    /// Server-assigned on first persistence.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-assigned on every update.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Signal {
    /// Builds a freshly captured signal with a new id, `Inbox` status, and the
    /// default source. Optional fields are left for the caller to fill.
    pub fn capture(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: SignalId::generate(),
            title: title.into(),
            body: None,
            date: Some(date),
            source: default_source(),
            author_id: None,
            author_name: None,
            author_email: None,
            author_brand_ids: Vec::new(),
            restaurant_ids: Vec::new(),
            theme_ids: Vec::new(),
            priority: None,
            status: SignalStatus::Inbox,
            created_at: None,
            updated_at: None,
        }
    }

    /// The timestamp used for display ordering: `date`, else `created_at`.
    pub fn display_time(&self) -> Option<DateTime<Utc>> {
        self.date.or(self.created_at)
    }

    /// Fills the author fields from a session identity.
    pub fn with_author(mut self, identity: &Identity, brand_ids: Vec<String>) -> Self {
        self.author_id = Some(identity.id.clone());
        self.author_name = identity.name.clone();
        self.author_email = identity.email.clone();
        self.author_brand_ids = brand_ids;
        self
    }
}

/// A signal waiting in the local queue for delivery.
///
/// Serializes flat, as the signal's own keys plus `queuedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    #[serde(flatten)]
    pub signal: Signal,
    pub queued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn from_signal(signal: Signal, queued_at: DateTime<Utc>) -> Self {
        Self { signal, queued_at }
    }

    /// Strips the queue bookkeeping, returning the signal for resend.
    pub fn into_signal(self) -> Signal {
        self.signal
    }

    pub fn id(&self) -> &SignalId {
        &self.signal.id
    }
}

/// Identity of the signed-in user, resolved from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A bearer token plus the moment it was stored locally.
///
/// Expiry is enforced from `stored_at` alone; the token's own claims are not
/// inspected.
#[derive(Debug)]
pub struct Credential {
    pub token: SecretString,
    pub stored_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, stored_at: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            stored_at,
        }
    }

    /// Whether the credential is still inside its validity window at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, validity: TimeDelta) -> bool {
        now.signed_duration_since(self.stored_at) < validity
    }
}

/// Query parameters accepted by the fetch-all endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SignalStatus>,
}

/// The server's acknowledgement of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitAck(pub serde_json::Value);

impl SubmitAck {
    /// The persisted signal echoed back by the server, if it sent one.
    pub fn signal(&self) -> Option<Signal> {
        let value = self.0.get("signal").unwrap_or(&self.0);
        serde_json::from_value(value.clone()).ok()
    }
}

/// A change notification from the live feed, already in canonical shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Insert(Signal),
    Update(Signal),
    Delete(SignalId),
}

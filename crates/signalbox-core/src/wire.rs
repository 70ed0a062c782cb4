// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary mapping between the live feed's row schema and [`Signal`].
//!
//! The live feed mirrors the server's signal table directly, so its records
//! carry snake_case column names (`restaurant_ids`, `author_email`,
//! `created_at`, ...). Everything past this module works with the camelCase
//! canonical shape only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Priority, Signal, SignalId, SignalStatus, DEFAULT_SOURCE};

/// A signal row as delivered by the live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSignal {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub author_brand_ids: Option<Vec<String>>,
    #[serde(default)]
    pub restaurant_ids: Option<Vec<String>>,
    #[serde(default)]
    pub theme_ids: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<SignalStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<WireSignal> for Signal {
    fn from(row: WireSignal) -> Self {
        Signal {
            id: SignalId(row.id),
            title: row.title,
            body: row.body,
            date: row.date,
            source: row
                .source
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            author_id: row.author_id,
            author_name: row.author_name,
            author_email: row.author_email,
            author_brand_ids: row.author_brand_ids.unwrap_or_default(),
            restaurant_ids: row.restaurant_ids.unwrap_or_default(),
            theme_ids: row.theme_ids.unwrap_or_default(),
            priority: row.priority,
            status: row.status.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Signal> for WireSignal {
    fn from(signal: &Signal) -> Self {
        WireSignal {
            id: signal.id.0.clone(),
            title: signal.title.clone(),
            body: signal.body.clone(),
            date: signal.date,
            source: Some(signal.source.clone()),
            author_id: signal.author_id.clone(),
            author_name: signal.author_name.clone(),
            author_email: signal.author_email.clone(),
            author_brand_ids: Some(signal.author_brand_ids.clone()),
            restaurant_ids: Some(signal.restaurant_ids.clone()),
            theme_ids: Some(signal.theme_ids.clone()),
            priority: signal.priority,
            status: Some(signal.status),
            created_at: signal.created_at,
            updated_at: signal.updated_at,
        }
    }
}

/// Decodes a raw feed row (JSON object) into the canonical shape.
pub fn signal_from_row(row: serde_json::Value) -> Result<Signal, serde_json::Error> {
    serde_json::from_value::<WireSignal>(row).map(Signal::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn row_keys_map_to_canonical_fields() {
        let row = serde_json::json!({
            "id": "abc",
            "title": "Chybí lístek",
            "restaurant_ids": ["r1", "r2"],
            "theme_ids": ["t1"],
            "author_id": "u1",
            "author_name": "Jana",
            "author_email": "jana@example.cz",
            "author_brand_ids": ["b1"],
            "status": "triaged",
            "created_at": "2026-03-01T09:00:00Z"
        });
        let signal = signal_from_row(row).unwrap();
        assert_eq!(signal.id, SignalId::from("abc"));
        assert_eq!(signal.restaurant_ids, vec!["r1", "r2"]);
        assert_eq!(signal.theme_ids, vec!["t1"]);
        assert_eq!(signal.author_email.as_deref(), Some("jana@example.cz"));
        assert_eq!(signal.author_brand_ids, vec!["b1"]);
        assert_eq!(signal.status, SignalStatus::Triaged);
        assert_eq!(
            signal.created_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn null_and_missing_columns_take_defaults() {
        let row = serde_json::json!({
            "id": "abc",
            "title": "A",
            "source": null,
            "restaurant_ids": null,
            "status": null
        });
        let signal = signal_from_row(row).unwrap();
        assert_eq!(signal.source, DEFAULT_SOURCE);
        assert!(signal.restaurant_ids.is_empty());
        assert_eq!(signal.status, SignalStatus::Inbox);
    }

    #[test]
    fn canonical_to_row_and_back_preserves_signal() {
        let mut signal = Signal::capture("A", Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        signal.restaurant_ids = vec!["r1".into()];
        signal.priority = Some(Priority::High);
        signal.author_email = Some("a@b.cz".into());

        let row = serde_json::to_value(WireSignal::from(&signal)).unwrap();
        assert!(row.get("restaurant_ids").is_some());
        assert!(row.get("restaurantIds").is_none());

        assert_eq!(signal_from_row(row).unwrap(), signal);
    }

    #[test]
    fn row_without_id_is_rejected() {
        assert!(signal_from_row(serde_json::json!({"title": "A"})).is_err());
    }
}

// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Signalbox capture pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Signalbox configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignalboxConfig {
    /// Process-level settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Signal API endpoints.
    #[serde(default)]
    pub api: ApiConfig,

    /// Local key-value storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential lifetime.
    #[serde(default)]
    pub session: SessionConfig,

    /// Capture flow timings and limits.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Reconciliation and live feed settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Static author email to brand id mapping.
    #[serde(default)]
    pub brands: BTreeMap<String, Vec<String>>,
}

impl SignalboxConfig {
    /// Brand ids for an author email. Lookup ignores ASCII case.
    pub fn brand_ids_for(&self, email: &str) -> Vec<String> {
        self.brands
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(email.trim()))
            .map(|(_, ids)| ids.clone())
            .unwrap_or_default()
    }
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Signal API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the signal API (scheme + host + optional port).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the submission endpoint.
    #[serde(default = "default_signals_path")]
    pub submit_path: String,

    /// Path of the fetch-all endpoint.
    #[serde(default = "default_signals_path")]
    pub list_path: String,

    /// Websocket URL of the live feed. `None` disables the live feed.
    #[serde(default)]
    pub feed_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout of the connectivity probe in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            submit_path: default_signals_path(),
            list_path: default_signals_path(),
            feed_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_signals_path() -> String {
    "/api/signals".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_probe_timeout_secs() -> u64 {
    3
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Key holding the JSON-encoded queue list.
    #[serde(default = "default_queue_key")]
    pub queue_key: String,

    /// Key holding the bearer token.
    #[serde(default = "default_credential_key")]
    pub credential_key: String,

    /// Key holding the credential's storage timestamp.
    #[serde(default = "default_credential_stored_at_key")]
    pub credential_stored_at_key: String,

    /// Key holding the signed-in identity.
    #[serde(default = "default_identity_key")]
    pub identity_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            queue_key: default_queue_key(),
            credential_key: default_credential_key(),
            credential_stored_at_key: default_credential_stored_at_key(),
            identity_key: default_identity_key(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("signalbox").join("signalbox.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "signalbox.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

fn default_queue_key() -> String {
    "signalbox.queue".to_string()
}

fn default_credential_key() -> String {
    "signalbox.credential".to_string()
}

fn default_credential_stored_at_key() -> String {
    "signalbox.credential.stored_at".to_string()
}

fn default_identity_key() -> String {
    "signalbox.identity".to_string()
}

/// Upper bound for `session.validity_minutes`: one year.
pub const MAX_VALIDITY_MINUTES: i64 = 365 * 24 * 60;

/// Credential lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Minutes a stored credential stays valid, measured from storage time.
    #[serde(default = "default_validity_minutes")]
    pub validity_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            validity_minutes: default_validity_minutes(),
        }
    }
}

fn default_validity_minutes() -> i64 {
    55
}

/// Capture flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// Minimum time spent in the sending state, in milliseconds.
    #[serde(default = "default_min_processing_ms")]
    pub min_processing_ms: u64,

    /// How long the success state is shown before resetting, in milliseconds.
    #[serde(default = "default_success_display_ms")]
    pub success_display_ms: u64,

    /// Source tag applied to captured signals.
    #[serde(default = "default_source")]
    pub default_source: String,

    /// Maximum title length in characters.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_processing_ms: default_min_processing_ms(),
            success_display_ms: default_success_display_ms(),
            default_source: default_source(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

fn default_min_processing_ms() -> u64 {
    1200
}

fn default_success_display_ms() -> u64 {
    2000
}

fn default_source() -> String {
    "quick_capture".to_string()
}

fn default_title_max_chars() -> usize {
    300
}

/// Reconciliation and live feed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Interval between connectivity probes, in seconds.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,

    /// Delay before retrying a failed live feed baseline fetch, in seconds.
    #[serde(default = "default_baseline_retry_secs")]
    pub baseline_retry_secs: u64,

    /// Page size used when fetching the full signal set.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval_secs(),
            baseline_retry_secs: default_baseline_retry_secs(),
            page_size: default_page_size(),
        }
    }
}

fn default_probe_interval_secs() -> u64 {
    15
}

fn default_baseline_retry_secs() -> u64 {
    5
}

fn default_page_size() -> u32 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_lookup_ignores_case() {
        let mut config = SignalboxConfig::default();
        config
            .brands
            .insert("Jana@Example.cz".into(), vec!["b1".into(), "b2".into()]);
        assert_eq!(config.brand_ids_for("jana@example.cz"), vec!["b1", "b2"]);
        assert!(config.brand_ids_for("petr@example.cz").is_empty());
    }
}

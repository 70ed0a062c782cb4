// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, non-empty paths, and positive limits.

use crate::diagnostic::ConfigError;
use crate::model::{SignalboxConfig, MAX_VALIDITY_MINUTES};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SignalboxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "api.base_url must not be empty".to_string(),
        });
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("api.base_url `{base_url}` must use http:// or https://"),
        });
    }

    for (key, path) in [
        ("api.submit_path", &config.api.submit_path),
        ("api.list_path", &config.api.list_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{path}` must start with `/`"),
            });
        }
    }

    if let Some(feed_url) = &config.api.feed_url
        && !(feed_url.starts_with("ws://") || feed_url.starts_with("wss://"))
    {
        errors.push(ConfigError::Validation {
            message: format!("api.feed_url `{feed_url}` must use ws:// or wss://"),
        });
    }

    if config.api.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "api.request_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let keys = [
        &config.storage.queue_key,
        &config.storage.credential_key,
        &config.storage.credential_stored_at_key,
        &config.storage.identity_key,
    ];
    for (i, key) in keys.iter().enumerate() {
        if key.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "storage keys must not be empty".to_string(),
            });
        } else if keys[..i].contains(key) {
            errors.push(ConfigError::Validation {
                message: format!("storage key `{key}` is used for more than one value"),
            });
        }
    }

    let validity = config.session.validity_minutes;
    if validity <= 0 {
        errors.push(ConfigError::Validation {
            message: format!("session.validity_minutes must be positive, got {validity}"),
        });
    } else if validity > MAX_VALIDITY_MINUTES {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.validity_minutes must be at most {MAX_VALIDITY_MINUTES}, got {validity}"
            ),
        });
    }

    if config.capture.title_max_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "capture.title_max_chars must be greater than 0".to_string(),
        });
    }

    if config.capture.default_source.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "capture.default_source must not be empty".to_string(),
        });
    }

    if config.sync.page_size == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.page_size must be greater than 0".to_string(),
        });
    }

    if config.sync.probe_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.probe_interval_secs must be greater than 0".to_string(),
        });
    }

    for email in config.brands.keys() {
        if email.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "brands keys must be non-empty author emails".to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./signalbox.toml` > `~/.config/signalbox/signalbox.toml`
//! > `/etc/signalbox/signalbox.toml` with environment variable overrides via
//! the `SIGNALBOX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SignalboxConfig;

/// Sections whose env vars map `SIGNALBOX_<SECTION>_<KEY>` to `<section>.<key>`.
const SECTIONS: &[&str] = &["app", "api", "storage", "session", "capture", "sync"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/signalbox/signalbox.toml`
/// 3. `~/.config/signalbox/signalbox.toml`
/// 4. `./signalbox.toml`
/// 5. `SIGNALBOX_*` environment variables
pub fn load_config() -> Result<SignalboxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SignalboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SignalboxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SignalboxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SignalboxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/signalbox/signalbox.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("signalbox").join("signalbox.toml"));
    }
    paths.push(PathBuf::from("signalbox.toml"));
    paths
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let defaults = Figment::new().merge(Serialized::defaults(SignalboxConfig::default()));
    search_paths()
        .into_iter()
        .fold(defaults, |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `SIGNALBOX_API_BASE_URL` must become `api.base_url`, not
/// `api.base.url`.
fn env_provider() -> Env {
    Env::prefixed("SIGNALBOX_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

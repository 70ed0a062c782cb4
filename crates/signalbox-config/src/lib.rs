// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Signalbox capture pipeline.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use signalbox_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("API: {}", config.api.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SignalboxConfig;

use std::path::{Path, PathBuf};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment errors are converted to miette diagnostics with typo suggestions;
/// a config that parses is then checked by [`validation::validate_config`].
pub fn load_and_validate() -> Result<SignalboxConfig, Vec<ConfigError>> {
    validated(loader::load_config(), read_sources(&loader::search_paths()))
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<SignalboxConfig, Vec<ConfigError>> {
    validated(
        loader::load_config_from_path(path),
        read_sources(&[path.to_path_buf()]),
    )
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<SignalboxConfig, Vec<ConfigError>> {
    let sources = vec![("<inline>".to_string(), toml_content.to_string())];
    validated(loader::load_config_from_str(toml_content), sources)
}

fn validated(
    loaded: Result<SignalboxConfig, figment::Error>,
    sources: Vec<(String, String)>,
) -> Result<SignalboxConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Reads whichever of `paths` exist, for error span resolution.
fn read_sources(paths: &[PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}

// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer for absorbed local storage failures.
//!
//! Queue and credential storage never raise to the user. Failures are handed
//! to a [`StorageObserver`] instead so a host can surface them to its own
//! operational tooling.

use strum::{Display, IntoStaticStr};
use tracing::warn;

use crate::error::SignalError;

/// Which storage operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StorageOp {
    Read,
    Write,
    Clear,
    /// A value was present but could not be decoded.
    Decode,
}

pub trait StorageObserver: Send + Sync + 'static {
    fn storage_failure(&self, op: StorageOp, key: &str, error: &SignalError);
}

/// Default observer: a `warn` event plus the
/// `signalbox_storage_failures_total{op}` counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StorageObserver for TracingObserver {
    fn storage_failure(&self, op: StorageOp, key: &str, error: &SignalError) {
        warn!(op = %op, key, error = %error, "local storage operation failed, continuing");
        let op: &'static str = op.into();
        metrics::counter!("signalbox_storage_failures_total", "op" => op).increment(1);
    }
}

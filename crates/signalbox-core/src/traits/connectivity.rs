// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connectivity reporting consulted before any delivery attempt.

/// Reports whether the runtime currently believes the network is reachable.
///
/// A `true` answer is only a hint: the send itself may still fail at the
/// transport layer, and callers handle that path too.
pub trait Connectivity: Send + Sync + 'static {
    fn is_online(&self) -> bool;
}

// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of signals for terminal output.

use signalbox_core::Signal;

/// One line per signal: display time, status, optional priority, title.
pub fn signal_line(signal: &Signal) -> String {
    let when = signal
        .display_time()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".repeat(16));
    let priority = signal
        .priority
        .map(|p| format!(" [{p}]"))
        .unwrap_or_default();
    format!(
        "{when}  {:<9} {}{priority}  ({})",
        signal.status.to_string(),
        signal.title,
        signal.id
    )
}

pub fn print_signals(signals: &[Signal]) {
    if signals.is_empty() {
        println!("  (no signals)");
        return;
    }
    for signal in signals {
        println!("  {}", signal_line(signal));
    }
}

/// Pretty JSON, falling back to an empty array if encoding fails.
pub fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use signalbox_core::{Priority, SignalId};

    #[test]
    fn line_shows_time_status_title_and_priority() {
        let mut signal = Signal::capture(
            "Rozbitá myčka",
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        );
        signal.id = SignalId::from("s-1");
        signal.priority = Some(Priority::High);
        assert_eq!(
            signal_line(&signal),
            "2026-03-01 09:30  inbox     Rozbitá myčka [high]  (s-1)"
        );
    }

    #[test]
    fn line_without_any_timestamp_uses_placeholder() {
        let mut signal = Signal::capture("x", Utc::now());
        signal.date = None;
        signal.created_at = None;
        assert!(signal_line(&signal).starts_with("----------------  inbox"));
    }

    #[test]
    fn json_is_pretty_printed() {
        assert_eq!(to_json(&vec![1, 2]), "[\n  1,\n  2\n]");
    }
}

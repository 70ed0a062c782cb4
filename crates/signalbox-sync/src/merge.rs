// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-source merge of live and local signals into one display list.

use std::collections::HashMap;

use signalbox_core::{Signal, SignalId};

/// Merges the live mirror with locally held signals.
///
/// The inputs are concatenated live-then-local and deduplicated by id,
/// keeping the last occurrence, so a local version always wins over a live
/// one. The result is stably sorted by [`Signal::display_time`] descending;
/// signals with neither `date` nor `createdAt` sort last. Pure: equal inputs
/// always give an identical output.
pub fn merge_signals(live: &[Signal], local: &[Signal]) -> Vec<Signal> {
    let combined: Vec<&Signal> = live.iter().chain(local).collect();

    let mut last_seen: HashMap<&SignalId, usize> = HashMap::with_capacity(combined.len());
    for (position, signal) in combined.iter().enumerate() {
        last_seen.insert(&signal.id, position);
    }

    let mut merged: Vec<Signal> = combined
        .iter()
        .enumerate()
        .filter(|(position, signal)| last_seen.get(&signal.id) == Some(position))
        .map(|(_, signal)| (*signal).clone())
        .collect();

    // `Option` orders `None` first, so reversing puts undated signals last.
    merged.sort_by(|a, b| b.display_time().cmp(&a.display_time()));
    merged
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use signalbox_core::SignalStatus;

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn signal(id: &str, title: &str, date: Option<DateTime<Utc>>) -> Signal {
        let mut signal = Signal::capture(title, at(0));
        signal.id = SignalId::from(id);
        signal.date = date;
        signal
    }

    #[test]
    fn local_version_wins_for_same_id() {
        let mut local = signal("abc", "A", Some(at(9)));
        local.status = SignalStatus::Triaged;
        let live = signal("abc", "A-old", Some(at(9)));

        let merged = merge_signals(&[live], std::slice::from_ref(&local));
        assert_eq!(merged, vec![local]);
    }

    #[test]
    fn sorted_newest_first_with_created_at_fallback() {
        let dated = signal("dated", "d", Some(at(10)));
        let mut created_only = signal("created", "c", None);
        created_only.created_at = Some(at(11));
        let undated = signal("none", "n", None);

        let merged = merge_signals(&[undated, dated], &[created_only]);
        let ids: Vec<_> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["created", "dated", "none"]);
    }

    #[test]
    fn ties_keep_dedup_order() {
        let a = signal("a", "a", Some(at(9)));
        let b = signal("b", "b", Some(at(9)));
        let c = signal("c", "c", Some(at(9)));

        let merged = merge_signals(&[a.clone(), b.clone()], std::slice::from_ref(&c));
        let ids: Vec<_> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_inputs_merge_to_empty() {
        assert!(merge_signals(&[], &[]).is_empty());
    }

    fn arb_signal(tag: &'static str) -> impl Strategy<Value = Signal> {
        (0u8..6, proptest::option::of(0u32..24), "[a-z]{1,6}").prop_map(
            move |(id, hour, title)| signal(&format!("s{id}"), &format!("{tag}-{title}"), hour.map(at)),
        )
    }

    proptest! {
        #[test]
        fn local_always_wins(
            live in proptest::collection::vec(arb_signal("live"), 0..12),
            local in proptest::collection::vec(arb_signal("local"), 0..12),
        ) {
            let merged = merge_signals(&live, &local);
            for winner in &local {
                let last_local = local.iter().rev().find(|s| s.id == winner.id).unwrap();
                let out = merged.iter().find(|s| s.id == winner.id).unwrap();
                prop_assert_eq!(out, last_local);
            }
        }

        #[test]
        fn output_is_deduplicated_and_ordered(
            live in proptest::collection::vec(arb_signal("live"), 0..12),
            local in proptest::collection::vec(arb_signal("local"), 0..12),
        ) {
            let merged = merge_signals(&live, &local);
            let mut ids: Vec<_> = merged.iter().map(|s| s.id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), merged.len());
            for pair in merged.windows(2) {
                prop_assert!(pair[0].display_time() >= pair[1].display_time());
            }
            prop_assert_eq!(merge_signals(&live, &local), merged);
        }
    }
}

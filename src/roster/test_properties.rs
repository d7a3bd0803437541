//! Property-based tests for roster invariants.
//!
//! Arbitrary sequences of connects, disconnects, navigation, flags, commits and
//! clears must keep the roster bounded, the cursor in range with exactly one
//! selected entry, terminal statuses frozen, and commits idempotent.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use super::commit::ActionExecutor;
use super::pagination::visible_window;
use super::record::{ConnectionRecord, DisconnectKey, OfflineKillPolicy, Status};
use super::store::Roster;
use crate::actions::RecordingExecutor;

// ──────────────────── strategies ────────────────────

#[derive(Debug, Clone)]
enum Op {
    Connect(u8),
    Disconnect(u8),
    MoveBy(i8),
    Home,
    End,
    FlagKill,
    FlagAkill,
    Unflag,
    Commit,
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..16).prop_map(Op::Connect),
        2 => (0u8..16).prop_map(Op::Disconnect),
        3 => (-12i8..=12).prop_map(Op::MoveBy),
        1 => Just(Op::Home),
        1 => Just(Op::End),
        1 => Just(Op::FlagKill),
        1 => Just(Op::FlagAkill),
        1 => Just(Op::Unflag),
        1 => Just(Op::Commit),
        1 => Just(Op::Clear),
    ]
}

fn arb_policy() -> impl Strategy<Value = OfflineKillPolicy> {
    prop_oneof![Just(OfflineKillPolicy::Refuse), Just(OfflineKillPolicy::Allow)]
}

fn record_for(host: u8, serial: usize) -> ConnectionRecord {
    let ts = Utc
        .timestamp_opt(1_700_000_000 + i64::try_from(serial).unwrap_or(0), 0)
        .single()
        .expect("valid timestamp");
    ConnectionRecord::new(ts, format!("n{serial}"), "~u", format!("10.0.0.{host}"))
}

fn key_for(host: u8) -> DisconnectKey {
    DisconnectKey::new("~u", format!("10.0.0.{host}"))
}

fn apply(roster: &mut Roster, op: &Op, serial: &mut usize, exec: &mut dyn ActionExecutor) {
    match *op {
        Op::Connect(host) => {
            *serial += 1;
            roster.append(record_for(host, *serial));
        }
        Op::Disconnect(host) => {
            roster.mark_disconnected(&key_for(host));
        }
        Op::MoveBy(delta) => {
            roster.move_by(isize::from(delta));
        }
        Op::Home => {
            roster.move_to_start();
        }
        Op::End => {
            roster.move_to_end();
        }
        Op::FlagKill => {
            roster.flag_selected_kill();
        }
        Op::FlagAkill => {
            roster.flag_selected_akill();
        }
        Op::Unflag => {
            roster.unflag_selected();
        }
        Op::Commit => {
            roster.commit_all("Drones", exec);
        }
        Op::Clear => {
            roster.clear();
        }
    }
}

// ──────────────────── invariant checks ────────────────────

fn assert_roster_invariants(roster: &Roster) {
    assert!(
        roster.len() <= roster.capacity(),
        "len {} exceeds capacity {}",
        roster.len(),
        roster.capacity()
    );

    if roster.is_empty() {
        assert_eq!(roster.cursor(), 0, "cursor non-zero on empty roster");
        assert_eq!(roster.iter().filter(|e| e.selected).count(), 0);
        return;
    }

    assert!(
        roster.cursor() < roster.len(),
        "cursor {} out of range for len {}",
        roster.cursor(),
        roster.len()
    );
    let selected: Vec<usize> = roster
        .iter()
        .filter(|e| e.selected)
        .map(|e| e.index)
        .collect();
    assert_eq!(selected, vec![roster.cursor()], "exactly one selected entry");

    for entry in roster.iter() {
        let record = entry.record;
        if !record.is_online() {
            assert_ne!(
                record.status(),
                Status::Online,
                "offline record {} still marked online",
                record.nick()
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any op sequence preserves the structural roster invariants.
    #[test]
    fn ops_preserve_invariants(
        capacity in 1usize..12,
        policy in arb_policy(),
        ops in prop::collection::vec(arb_op(), 1..80)
    ) {
        let mut roster = Roster::new(capacity).with_offline_kill(policy);
        let mut exec = RecordingExecutor::default();
        let mut serial = 0;
        for op in &ops {
            apply(&mut roster, op, &mut serial, &mut exec);
            assert_roster_invariants(&roster);
        }
    }

    /// Survivors are exactly the most recent `capacity` connects, in order.
    #[test]
    fn fifo_eviction_keeps_most_recent(
        capacity in 1usize..20,
        hosts in prop::collection::vec(0u8..255, 0..60)
    ) {
        let mut roster = Roster::new(capacity);
        for (serial, host) in hosts.iter().enumerate() {
            roster.append(record_for(*host, serial));
        }
        let expected: Vec<String> = (0..hosts.len())
            .skip(hosts.len().saturating_sub(capacity))
            .map(|serial| format!("n{serial}"))
            .collect();
        let actual: Vec<String> = roster.iter().map(|e| e.record.nick().to_owned()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// A commit immediately after a commit never reaches the executor.
    #[test]
    fn commit_all_is_idempotent(
        ops in prop::collection::vec(arb_op(), 1..60)
    ) {
        let mut roster = Roster::new(16);
        let mut exec = RecordingExecutor::default();
        let mut serial = 0;
        for op in &ops {
            apply(&mut roster, op, &mut serial, &mut exec);
        }
        roster.commit_all("Drones", &mut exec);
        let before = exec.actions.len();
        let report = roster.commit_all("Drones", &mut exec);
        prop_assert!(report.is_empty());
        prop_assert_eq!(exec.actions.len(), before);
        prop_assert_eq!(roster.pending_count(), 0);
    }

    /// Terminal records never change status again.
    #[test]
    fn terminal_statuses_are_frozen(
        ops in prop::collection::vec(arb_op(), 1..60)
    ) {
        let mut roster = Roster::new(64).with_offline_kill(OfflineKillPolicy::Allow);
        let mut exec = RecordingExecutor::default();
        let mut serial = 0;
        let mut terminal: Vec<(String, Status)> = Vec::new();
        for op in &ops {
            if matches!(op, Op::Clear) {
                // Clearing drops records entirely; nothing left to compare.
                terminal.clear();
            }
            apply(&mut roster, op, &mut serial, &mut exec);
            for (nick, status) in &terminal {
                if let Some(entry) = roster.iter().find(|e| e.record.nick() == nick) {
                    prop_assert_eq!(entry.record.status(), *status);
                }
            }
            for entry in roster.iter() {
                let status = entry.record.status();
                if status.is_terminal() && !terminal.iter().any(|(n, _)| n == entry.record.nick()) {
                    terminal.push((entry.record.nick().to_owned(), status));
                }
            }
        }
    }

    /// Moving up from the top never moves.
    #[test]
    fn move_up_is_idempotent_at_top(
        count in 1usize..30,
        repeats in 1usize..10
    ) {
        let mut roster = Roster::new(64);
        for serial in 0..count {
            roster.append(record_for(1, serial));
        }
        roster.move_to_start();
        for _ in 0..repeats {
            prop_assert!(!roster.move_by(-1));
            prop_assert_eq!(roster.cursor(), 0);
        }
    }

    /// The visible window always contains the cursor and is page aligned.
    #[test]
    fn window_contains_cursor(
        total in 1usize..500,
        cursor_seed in 0usize..500,
        height in 1usize..80
    ) {
        let cursor = cursor_seed % total;
        let w = visible_window(cursor, height, total);
        prop_assert!(w.contains(cursor));
        prop_assert_eq!(w.start % height, 0);
        prop_assert_eq!(w.end - w.start + 1, height);
        prop_assert!(w.range().end <= total);
    }

    /// Flag then unflag restores the previous status.
    #[test]
    fn flag_unflag_round_trip(
        disconnected in any::<bool>(),
        akill in any::<bool>()
    ) {
        let mut record = record_for(3, 0);
        if disconnected {
            record.mark_disconnected();
        }
        let before = record.status();
        let flagged = if akill {
            record.flag_akill()
        } else {
            record.flag_kill(OfflineKillPolicy::Allow)
        };
        prop_assert!(flagged);
        prop_assert!(record.unflag());
        prop_assert_eq!(record.status(), before);
    }

    /// A client that leaves while flagged ends up offline and is never actioned.
    #[test]
    fn disconnect_after_flag_goes_offline(
        hosts in 1u8..16,
        pick_seed in 0u8..16,
        akill in any::<bool>()
    ) {
        let mut roster = Roster::new(32).with_offline_kill(OfflineKillPolicy::Allow);
        for host in 0..hosts {
            roster.append(record_for(host, usize::from(host)));
        }
        let pick = pick_seed % hosts;
        roster.move_to_start();
        roster.move_by(isize::from(pick));
        let flagged = if akill {
            roster.flag_selected_akill()
        } else {
            roster.flag_selected_kill()
        };
        prop_assert!(flagged);
        prop_assert_eq!(roster.pending_count(), 1);

        prop_assert!(roster.mark_disconnected(&key_for(pick)));
        let record = roster.selected().expect("selection survives disconnect");
        prop_assert!(!record.is_online());
        prop_assert_eq!(record.status(), Status::Offline);
        prop_assert_eq!(roster.pending_count(), 0);

        let mut exec = RecordingExecutor::default();
        let report = roster.commit_all("Drones", &mut exec);
        prop_assert!(report.is_empty());
        prop_assert!(exec.actions.is_empty());
    }
}

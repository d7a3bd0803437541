//! Bounded, order-preserving roster with a single selection cursor.
//!
//! Records are kept in connection order. When the roster overflows, the oldest
//! record is evicted and the cursor is shifted so it keeps pointing at the same
//! record. If the selected record itself was evicted, the new head is selected.

use std::collections::VecDeque;

use crate::core::config::RosterConfig;
use crate::roster::commit::{ActionExecutor, CommitReport, commit_records};
use crate::roster::pagination::{Window, visible_window};
use crate::roster::record::{
    ConnectionRecord, DisconnectKey, MatchKey, OfflineKillPolicy, Status,
};

/// Default roster capacity.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A record together with its position and selection state.
#[derive(Debug, Clone, Copy)]
pub struct RosterEntry<'a> {
    /// Position in the roster, oldest first.
    pub index: usize,
    /// The record at that position.
    pub record: &'a ConnectionRecord,
    /// Whether the cursor is on this record.
    pub selected: bool,
}

/// The operator's list of recent connections.
#[derive(Debug, Clone)]
pub struct Roster {
    records: VecDeque<ConnectionRecord>,
    cursor: usize,
    capacity: usize,
    match_key: MatchKey,
    offline_kill: OfflineKillPolicy,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Roster {
    /// Empty roster holding at most `capacity` records (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
            match_key: MatchKey::default(),
            offline_kill: OfflineKillPolicy::default(),
        }
    }

    /// Empty roster sized and configured from the `[roster]` section.
    #[must_use]
    pub fn from_config(config: &RosterConfig) -> Self {
        Self::new(config.capacity)
            .with_match_key(config.match_key)
            .with_offline_kill(config.offline_kill)
    }

    /// Use `match_key` to correlate disconnects.
    #[must_use]
    pub fn with_match_key(mut self, match_key: MatchKey) -> Self {
        self.match_key = match_key;
        self
    }

    /// Use `policy` when flagging offline records for KILL.
    #[must_use]
    pub fn with_offline_kill(mut self, policy: OfflineKillPolicy) -> Self {
        self.offline_kill = policy;
        self
    }

    // ── accessors ──

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the roster holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records kept before eviction.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cursor index. Always 0 for an empty roster.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Disconnect correlation mode.
    #[must_use]
    pub const fn match_key(&self) -> MatchKey {
        self.match_key
    }

    /// Policy for flagging offline records for KILL.
    #[must_use]
    pub const fn offline_kill(&self) -> OfflineKillPolicy {
        self.offline_kill
    }

    /// The record under the cursor, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&ConnectionRecord> {
        self.records.get(self.cursor)
    }

    /// The record at `index`, oldest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ConnectionRecord> {
        self.records.get(index)
    }

    /// All records oldest first, with their derived selection flag.
    pub fn iter(&self) -> impl Iterator<Item = RosterEntry<'_>> {
        let cursor = self.cursor;
        self.records
            .iter()
            .enumerate()
            .map(move |(index, record)| RosterEntry {
                index,
                record,
                selected: index == cursor,
            })
    }

    /// Number of records flagged and waiting for commit.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status().is_pending())
            .count()
    }

    /// Visible window for a viewport of `height` rows.
    #[must_use]
    pub fn window(&self, height: usize) -> Window {
        visible_window(self.cursor, height, self.records.len())
    }

    // ── mutation ──

    /// Append a newly connected client.
    ///
    /// The cursor follows the append when the roster was empty or the operator
    /// was on the newest record. Returns the record evicted by overflow.
    pub fn append(&mut self, record: ConnectionRecord) -> Option<ConnectionRecord> {
        let follow = self.records.is_empty() || self.cursor + 1 == self.records.len();
        self.records.push_back(record);
        if follow {
            self.cursor = self.records.len() - 1;
        }

        if self.records.len() <= self.capacity {
            return None;
        }
        let evicted = self.records.pop_front();
        self.cursor = self.cursor.saturating_sub(1);
        evicted
    }

    /// First still-online record matching `key`, oldest first.
    #[must_use]
    pub fn find_by_key(&self, key: &DisconnectKey) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.is_online() && r.matches(key, self.match_key))
    }

    /// Apply a disconnect. Unmatched keys are dropped; returns `true` on a match.
    pub fn mark_disconnected(&mut self, key: &DisconnectKey) -> bool {
        let Some(index) = self.find_by_key(key) else {
            return false;
        };
        self.records[index].mark_disconnected()
    }

    /// Empty the roster. Returns `false` if it was already empty.
    pub fn clear(&mut self) -> bool {
        self.cursor = 0;
        if self.records.is_empty() {
            return false;
        }
        self.records.clear();
        true
    }

    // ── navigation ──

    /// Move the cursor by `delta`, clamped to the roster bounds.
    ///
    /// Returns `true` if the cursor moved.
    pub fn move_by(&mut self, delta: isize) -> bool {
        let Some(last) = self.records.len().checked_sub(1) else {
            return false;
        };
        let target = self.cursor.saturating_add_signed(delta).min(last);
        self.move_to(target)
    }

    /// Jump to the oldest record.
    pub fn move_to_start(&mut self) -> bool {
        if self.records.is_empty() {
            return false;
        }
        self.move_to(0)
    }

    /// Jump to the newest record.
    pub fn move_to_end(&mut self) -> bool {
        let Some(last) = self.records.len().checked_sub(1) else {
            return false;
        };
        self.move_to(last)
    }

    fn move_to(&mut self, target: usize) -> bool {
        if target == self.cursor {
            return false;
        }
        self.cursor = target;
        true
    }

    // ── flags ──

    /// Flag the selected record for KILL, subject to the offline-kill policy.
    pub fn flag_selected_kill(&mut self) -> bool {
        let policy = self.offline_kill;
        self.records
            .get_mut(self.cursor)
            .is_some_and(|r| r.flag_kill(policy))
    }

    /// Flag the selected record for AKILL.
    pub fn flag_selected_akill(&mut self) -> bool {
        self.records
            .get_mut(self.cursor)
            .is_some_and(ConnectionRecord::flag_akill)
    }

    /// Drop the selected record's pending flag.
    pub fn unflag_selected(&mut self) -> bool {
        self.records
            .get_mut(self.cursor)
            .is_some_and(ConnectionRecord::unflag)
    }

    /// Commit every pending flag in insertion order.
    pub fn commit_all(&mut self, reason: &str, executor: &mut dyn ActionExecutor) -> CommitReport {
        commit_records(self.records.iter_mut(), reason, executor)
    }

    /// Status of the selected record, if any.
    #[must_use]
    pub fn selected_status(&self) -> Option<Status> {
        self.selected().map(ConnectionRecord::status)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::actions::RecordingExecutor;
    use crate::roster::commit::ExecutedAction;

    fn rec(nick: &str) -> ConnectionRecord {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid ts");
        ConnectionRecord::new(ts, nick, format!("~{nick}"), format!("10.0.0.{}", nick.len()))
    }

    fn rec_at(nick: &str, address: &str) -> ConnectionRecord {
        ConnectionRecord::new(Utc::now(), nick, "~u", address)
    }

    fn roster_of(capacity: usize, nicks: &[&str]) -> Roster {
        let mut roster = Roster::new(capacity);
        for nick in nicks {
            roster.append(rec(nick));
        }
        roster
    }

    fn nicks(roster: &Roster) -> Vec<String> {
        roster.iter().map(|e| e.record.nick().to_owned()).collect()
    }

    fn selected_count(roster: &Roster) -> usize {
        roster.iter().filter(|e| e.selected).count()
    }

    // ── append / eviction ──

    #[test]
    fn first_append_selects_new_record() {
        let mut roster = Roster::new(10);
        roster.append(rec("a"));
        assert_eq!(roster.cursor(), 0);
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("a"));
    }

    #[test]
    fn cursor_follows_appends_when_on_newest() {
        let roster = roster_of(10, &["a", "b", "c"]);
        assert_eq!(roster.cursor(), 2);
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("c"));
    }

    #[test]
    fn cursor_stays_when_operator_scrolled_back() {
        let mut roster = roster_of(10, &["a", "b", "c"]);
        roster.move_to_start();
        roster.append(rec("d"));
        assert_eq!(roster.cursor(), 0);
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("a"));
    }

    #[test]
    fn overflow_evicts_oldest_and_keeps_selection_on_tail() {
        let mut roster = roster_of(2, &["a", "b"]);
        assert_eq!(roster.cursor(), 1);

        let evicted = roster.append(rec("c"));

        assert_eq!(evicted.map(|r| r.nick().to_owned()), Some("a".to_owned()));
        assert_eq!(nicks(&roster), ["b", "c"]);
        assert_eq!(roster.cursor(), 1);
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("c"));
    }

    #[test]
    fn overflow_preserves_selected_record_when_not_at_tail() {
        let mut roster = roster_of(3, &["a", "b", "c"]);
        roster.move_by(-1);
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("b"));

        roster.append(rec("d"));

        assert_eq!(nicks(&roster), ["b", "c", "d"]);
        assert_eq!(roster.cursor(), 0);
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("b"));
    }

    #[test]
    fn overflow_evicting_selected_head_selects_new_head() {
        let mut roster = roster_of(3, &["a", "b", "c"]);
        roster.move_to_start();

        roster.append(rec("d"));

        assert_eq!(nicks(&roster), ["b", "c", "d"]);
        assert_eq!(roster.cursor(), 0);
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("b"));
        assert_eq!(selected_count(&roster), 1);
    }

    #[test]
    fn capacity_one_always_holds_newest() {
        let mut roster = roster_of(1, &["a", "b", "c"]);
        assert_eq!(nicks(&roster), ["c"]);
        assert_eq!(roster.cursor(), 0);
        roster.append(rec("d"));
        assert_eq!(nicks(&roster), ["d"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(Roster::new(0).capacity(), 1);
    }

    // ── navigation ──

    #[test]
    fn move_by_reports_boundary_noops() {
        let mut roster = roster_of(10, &["a", "b", "c"]);
        roster.move_to_start();
        assert!(!roster.move_by(-1));
        assert!(!roster.move_by(-1));
        assert_eq!(roster.cursor(), 0);

        assert!(roster.move_by(1));
        assert_eq!(roster.cursor(), 1);
    }

    #[test]
    fn page_steps_clamp() {
        let names: Vec<String> = (0..25).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut roster = roster_of(100, &refs);
        roster.move_to_start();

        assert!(roster.move_by(10));
        assert_eq!(roster.cursor(), 10);
        assert!(roster.move_by(10));
        assert!(roster.move_by(10));
        assert_eq!(roster.cursor(), 24);
        assert!(!roster.move_by(10));

        assert!(roster.move_by(-100));
        assert_eq!(roster.cursor(), 0);
    }

    #[test]
    fn home_and_end() {
        let mut roster = roster_of(10, &["a", "b", "c"]);
        assert!(!roster.move_to_end());
        assert!(roster.move_to_start());
        assert!(!roster.move_to_start());
        assert!(roster.move_to_end());
        assert_eq!(roster.cursor(), 2);
    }

    #[test]
    fn navigation_on_empty_roster_is_noop() {
        let mut roster = Roster::new(10);
        assert!(!roster.move_by(1));
        assert!(!roster.move_by(-1));
        assert!(!roster.move_to_start());
        assert!(!roster.move_to_end());
        assert_eq!(roster.cursor(), 0);
        assert!(roster.selected().is_none());
    }

    #[test]
    fn exactly_one_entry_is_selected() {
        let mut roster = roster_of(10, &["a", "b", "c", "d"]);
        for delta in [-1, -2, 3, -10, 1] {
            roster.move_by(delta);
            assert_eq!(selected_count(&roster), 1);
            let selected = roster.iter().find(|e| e.selected).map(|e| e.index);
            assert_eq!(selected, Some(roster.cursor()));
        }
    }

    // ── flags / commit ──

    #[test]
    fn flag_ops_on_empty_roster_are_noops() {
        let mut roster = Roster::new(10);
        let mut exec = RecordingExecutor::default();
        assert!(!roster.flag_selected_kill());
        assert!(!roster.flag_selected_akill());
        assert!(!roster.unflag_selected());
        assert!(roster.commit_all("x", &mut exec).is_empty());
        assert!(!roster.clear());
    }

    #[test]
    fn akill_scenario_only_touches_flagged_record() {
        let mut roster = Roster::new(10);
        roster.append(rec_at("A", "10.0.0.1"));
        roster.append(rec_at("B", "10.0.0.2"));
        roster.append(rec_at("C", "10.0.0.3"));
        assert_eq!(roster.cursor(), 2);

        assert!(roster.flag_selected_akill());
        let mut exec = RecordingExecutor::default();
        let report = roster.commit_all("test", &mut exec);

        assert_eq!(
            exec.actions,
            vec![ExecutedAction::Akill {
                address: "10.0.0.3".into(),
                reason: "test".into()
            }]
        );
        assert_eq!(report.akills(), 1);
        assert_eq!(roster.get(2).map(ConnectionRecord::status), Some(Status::Akilled));
        assert_eq!(roster.get(0).map(ConnectionRecord::status), Some(Status::Online));
        assert_eq!(roster.get(1).map(ConnectionRecord::status), Some(Status::Online));
    }

    #[test]
    fn commit_all_twice_issues_nothing_the_second_time() {
        let mut roster = roster_of(10, &["a", "b", "c"]);
        roster.flag_selected_kill();
        roster.move_to_start();
        roster.flag_selected_akill();

        let mut exec = RecordingExecutor::default();
        assert_eq!(roster.commit_all("x", &mut exec).actions.len(), 2);
        assert!(roster.commit_all("x", &mut exec).is_empty());
        assert_eq!(exec.actions.len(), 2);
        assert_eq!(roster.pending_count(), 0);
    }

    #[test]
    fn pending_count_tracks_flags() {
        let mut roster = roster_of(10, &["a", "b"]);
        roster.flag_selected_kill();
        roster.move_to_start();
        roster.flag_selected_akill();
        assert_eq!(roster.pending_count(), 2);
        roster.unflag_selected();
        assert_eq!(roster.pending_count(), 1);
    }

    #[test]
    fn offline_kill_policy_is_applied_to_selected() {
        let key = DisconnectKey::new("~a", "10.0.0.1");

        let mut refusing = roster_of(10, &["a"]);
        refusing.mark_disconnected(&key);
        assert!(!refusing.flag_selected_kill());
        assert_eq!(refusing.selected_status(), Some(Status::Offline));

        let mut allowing = roster_of(10, &["a"]).with_offline_kill(OfflineKillPolicy::Allow);
        allowing.mark_disconnected(&key);
        assert!(allowing.flag_selected_kill());
        assert_eq!(allowing.selected_status(), Some(Status::KillPending));
    }

    // ── disconnect correlation ──

    #[test]
    fn disconnect_marks_oldest_online_match() {
        let mut roster = Roster::new(10);
        roster.append(rec_at("a", "10.0.0.1"));
        roster.append(rec_at("b", "10.0.0.1"));
        let key = DisconnectKey::new("~u", "10.0.0.1");

        assert_eq!(roster.find_by_key(&key), Some(0));
        assert!(roster.mark_disconnected(&key));
        assert_eq!(roster.find_by_key(&key), Some(1));
        assert!(roster.mark_disconnected(&key));
        assert!(!roster.mark_disconnected(&key));

        assert!(roster.iter().all(|e| !e.record.is_online()));
    }

    #[test]
    fn unmatched_disconnect_is_dropped() {
        let mut roster = roster_of(10, &["a"]);
        assert!(!roster.mark_disconnected(&DisconnectKey::new("~zz", "192.0.2.1")));
        assert_eq!(roster.selected_status(), Some(Status::Online));
    }

    #[test]
    fn address_only_matching() {
        let mut roster = Roster::new(10).with_match_key(MatchKey::Address);
        roster.append(rec_at("a", "10.0.0.9"));
        assert!(roster.mark_disconnected(&DisconnectKey::new("~other", "10.0.0.9")));
    }

    // ── clear / window ──

    #[test]
    fn clear_resets_cursor() {
        let mut roster = roster_of(10, &["a", "b", "c"]);
        assert!(roster.clear());
        assert!(roster.is_empty());
        assert_eq!(roster.cursor(), 0);
        assert!(!roster.clear());

        roster.append(rec("d"));
        assert_eq!(roster.selected().map(ConnectionRecord::nick), Some("d"));
    }

    #[test]
    fn window_follows_cursor_pages() {
        let names: Vec<String> = (0..25).map(|i| format!("n{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut roster = roster_of(100, &refs);
        assert_eq!(roster.window(10).start, 20);
        assert_eq!(roster.window(10).range(), 20..25);
        roster.move_to_start();
        assert_eq!(roster.window(10).range(), 0..10);
    }
}

//! Display lines for the visible roster window.
//!
//! Rendering is pure: it reads the roster and returns plain values. Colour
//! and terminal handling belong to the host surface.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::roster::record::Status;
use crate::roster::store::Roster;

/// Visual treatment for one line, derived from record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderHint {
    Normal,
    Offline,
    KillPending,
    AkillPending,
    Killed,
    Akilled,
}

impl RenderHint {
    #[must_use]
    pub const fn for_status(status: Status) -> Self {
        match status {
            Status::Online => Self::Normal,
            Status::Offline => Self::Offline,
            Status::KillPending => Self::KillPending,
            Status::AkillPending => Self::AkillPending,
            Status::Killed => Self::Killed,
            Status::Akilled => Self::Akilled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    pub index: usize,
    pub connected_at: DateTime<Utc>,
    pub nick: String,
    pub address: String,
    pub status: Status,
    pub hint: RenderHint,
    pub selected: bool,
}

/// Lines for the window containing the cursor, at most `height` of them.
#[must_use]
pub fn render(roster: &Roster, height: usize) -> Vec<DisplayLine> {
    let window = roster.window(height);
    roster
        .iter()
        .skip(window.start)
        .take(window.range().len())
        .map(|entry| DisplayLine {
            index: entry.index,
            connected_at: entry.record.connected_at(),
            nick: entry.record.nick().to_owned(),
            address: entry.record.address().to_owned(),
            status: entry.record.status(),
            hint: RenderHint::for_status(entry.record.status()),
            selected: entry.selected,
        })
        .collect()
}

/// Fixed-column text for one line, without colour.
///
/// The selection marker is `>`; `timestamp_format` is a `chrono` strftime
/// pattern.
#[must_use]
pub fn format_line(line: &DisplayLine, timestamp_format: &str) -> String {
    let marker = if line.selected { '>' } else { ' ' };
    format!(
        "{marker} {} {:<16} {:<39} {}",
        line.connected_at.format(timestamp_format),
        line.nick,
        line.address,
        line.status.label()
    )
}

/// One-line summary shown under the list.
#[must_use]
pub fn status_bar(roster: &Roster, height: usize) -> String {
    if roster.is_empty() {
        return "no connections tracked".to_string();
    }
    let window = roster.window(height);
    let range = window.range();
    format!(
        "{}-{} of {} | selected {} | {} pending",
        range.start + 1,
        range.end,
        roster.len(),
        roster.cursor() + 1,
        roster.pending_count()
    )
}

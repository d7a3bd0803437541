//! Paints the roster window on a terminal.
//!
//! Uses `crossterm` for cursor positioning and terminal size, and `colored`
//! for per-status styling so `--no-color` and `NO_COLOR` are honoured.

use std::io::{self, Write};

use colored::{ColoredString, Colorize};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};
use serde_json::{Value, json};

use crate::roster::store::Roster;
use crate::view::{self, DisplayLine, RenderHint};

/// Rows reserved below the list for the status bar.
const FOOTER_ROWS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenOptions {
    /// Rows available for connection lines.
    pub height: usize,
    pub timestamp_format: String,
    /// Clear the terminal and home the cursor before painting.
    pub clear: bool,
}

/// List rows that fit the current terminal, if it reports a size.
#[must_use]
pub fn terminal_list_height() -> Option<usize> {
    let (_, rows) = terminal::size().ok()?;
    let rows = usize::from(rows).saturating_sub(FOOTER_ROWS);
    (rows > 0).then_some(rows)
}

fn styled(line: &DisplayLine, text: String) -> ColoredString {
    let base = match line.hint {
        RenderHint::Normal => text.normal(),
        RenderHint::Offline => text.dimmed(),
        RenderHint::KillPending => text.yellow(),
        RenderHint::AkillPending => text.magenta(),
        RenderHint::Killed => text.red(),
        RenderHint::Akilled => text.red().bold(),
    };
    if line.selected { base.reversed() } else { base }
}

/// Paint the window containing the cursor followed by the status bar.
pub fn paint<W: Write>(out: &mut W, roster: &Roster, options: &ScreenOptions) -> io::Result<()> {
    if options.clear {
        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    }
    for line in view::render(roster, options.height) {
        let text = view::format_line(&line, &options.timestamp_format);
        writeln!(out, "{}", styled(&line, text))?;
    }
    writeln!(
        out,
        "{}",
        view::status_bar(roster, options.height).bold()
    )?;
    out.flush()
}

/// Machine-readable frame for JSON output mode.
#[must_use]
pub fn frame_json(command: &str, roster: &Roster, height: usize) -> Value {
    json!({
        "command": command,
        "total": roster.len(),
        "capacity": roster.capacity(),
        "cursor": roster.cursor(),
        "pending": roster.pending_count(),
        "height": height,
        "lines": view::render(roster, height),
    })
}

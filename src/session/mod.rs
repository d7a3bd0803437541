//! Session: the owned roster plus everything that feeds and drives it.
//!
//! A session turns host lines into roster appends and disconnects, maps
//! operator commands onto roster operations, and logs every state change.
//! It is single-threaded; each call runs to completion.

#![allow(missing_docs)]

pub mod command;

use chrono::{DateTime, Utc};

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::feed::{FeedParser, HostEvent};
use crate::logger::{ActivityEvent, ActivityLog};
use crate::roster::commit::{ActionExecutor, CommitReport};
use crate::roster::pagination::page_delta;
use crate::roster::record::ConnectionRecord;
use crate::roster::store::Roster;

pub use command::{COMMAND_PREFIX, OperatorCommand, ParseCommandError};

/// Per-session behaviour taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub reason: String,
    pub advance_after_flag: bool,
}

impl SessionSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            reason: config.actions.reason.clone(),
            advance_after_flag: config.roster.advance_after_flag,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of one dispatched command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Roster state or cursor changed.
    pub changed: bool,
    /// The host should redraw the list.
    pub redraw: bool,
}

impl Outcome {
    const fn from_change(changed: bool) -> Self {
        Self {
            changed,
            redraw: changed,
        }
    }
}

/// How one raw input line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Command(OperatorCommand, Outcome),
    /// A connect or disconnect notice; `true` if the roster changed.
    Feed(bool),
    /// A prefixed line that did not name a command.
    Rejected(ParseCommandError),
    Ignored,
}

impl LineOutcome {
    #[must_use]
    pub const fn needs_redraw(&self) -> bool {
        match self {
            Self::Command(_, outcome) => outcome.redraw,
            Self::Feed(changed) => *changed,
            Self::Rejected(_) | Self::Ignored => false,
        }
    }
}

pub struct Session<E: ActionExecutor> {
    roster: Roster,
    executor: E,
    parser: FeedParser,
    log: ActivityLog,
    settings: SessionSettings,
    last_commit: CommitReport,
}

impl<E: ActionExecutor> Session<E> {
    /// Build a session from configuration.
    pub fn new(config: &Config, executor: E, log: ActivityLog) -> Result<Self> {
        Ok(Self::from_parts(
            Roster::from_config(&config.roster),
            executor,
            FeedParser::new(&config.feed)?,
            log,
            SessionSettings::from_config(config),
        ))
    }

    pub fn from_parts(
        roster: Roster,
        executor: E,
        parser: FeedParser,
        log: ActivityLog,
        settings: SessionSettings,
    ) -> Self {
        Self {
            roster,
            executor,
            parser,
            log,
            settings,
            last_commit: CommitReport::default(),
        }
    }

    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    pub const fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub const fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Actions executed by the most recent `commit`.
    #[must_use]
    pub const fn last_commit(&self) -> &CommitReport {
        &self.last_commit
    }

    pub fn log_session_start(&mut self, version: &str, config_hash: &str) {
        self.log.record(&ActivityEvent::SessionStarted {
            version: version.to_owned(),
            config_hash: config_hash.to_owned(),
            capacity: self.roster.capacity(),
        });
    }

    /// Log the stop event, flush the log and hand back the roster and executor.
    pub fn finish(mut self) -> (Roster, E) {
        self.log.record(&ActivityEvent::SessionStopped {
            records: self.roster.len(),
            pending: self.roster.pending_count(),
        });
        self.log.flush();
        (self.roster, self.executor)
    }

    // ── host feed ──

    /// Feed one host line. Returns `true` if the roster changed.
    pub fn handle_line(&mut self, line: &str, now: DateTime<Utc>) -> bool {
        self.parser
            .parse_line(line, now)
            .is_some_and(|event| self.apply_event(&event))
    }

    /// Apply an already-parsed host event.
    pub fn apply_event(&mut self, event: &HostEvent) -> bool {
        match event {
            HostEvent::Connect { .. } => {
                let Some(record) = event.to_record() else {
                    return false;
                };
                self.connect(record);
                true
            }
            HostEvent::Disconnect { key, .. } => {
                let Some(index) = self.roster.find_by_key(key) else {
                    return false;
                };
                if !self.roster.mark_disconnected(key) {
                    return false;
                }
                if let Some(record) = self.roster.get(index) {
                    self.log.record(&ActivityEvent::disconnected(record));
                }
                true
            }
        }
    }

    fn connect(&mut self, record: ConnectionRecord) {
        self.log.record(&ActivityEvent::connected(&record));
        if let Some(evicted) = self.roster.append(record) {
            self.log.record(&ActivityEvent::evicted(&evicted));
        }
    }

    // ── operator input ──

    /// Route one raw input line: prefixed lines and bare command tokens are
    /// operator commands, everything else is host feed.
    pub fn handle_input(&mut self, line: &str, now: DateTime<Utc>, viewport: usize) -> LineOutcome {
        let trimmed = line.trim();
        let prefixed = trimmed
            .split_whitespace()
            .next()
            .is_some_and(|w| w.eq_ignore_ascii_case(COMMAND_PREFIX));

        match trimmed.parse::<OperatorCommand>() {
            Ok(command) => LineOutcome::Command(command, self.dispatch(command, viewport)),
            Err(err) if prefixed => {
                self.log.record(&ActivityEvent::Error {
                    code: "CL-CMD".to_string(),
                    message: err.to_string(),
                });
                LineOutcome::Rejected(err)
            }
            Err(_) => match self.parser.parse_line(line, now) {
                Some(event) => LineOutcome::Feed(self.apply_event(&event)),
                None => LineOutcome::Ignored,
            },
        }
    }

    /// Apply one operator command for a viewport of `viewport` rows.
    pub fn dispatch(&mut self, command: OperatorCommand, viewport: usize) -> Outcome {
        match command {
            OperatorCommand::Up => Outcome::from_change(self.roster.move_by(-1)),
            OperatorCommand::Down => Outcome::from_change(self.roster.move_by(1)),
            OperatorCommand::PageUp => {
                Outcome::from_change(self.roster.move_by(-page_delta(viewport)))
            }
            OperatorCommand::PageDown => {
                Outcome::from_change(self.roster.move_by(page_delta(viewport)))
            }
            OperatorCommand::Home => Outcome::from_change(self.roster.move_to_start()),
            OperatorCommand::End => Outcome::from_change(self.roster.move_to_end()),
            OperatorCommand::Kill => {
                let flagged = self.roster.flag_selected_kill();
                Outcome::from_change(self.after_flag(flagged))
            }
            OperatorCommand::Akill => {
                let flagged = self.roster.flag_selected_akill();
                Outcome::from_change(self.after_flag(flagged))
            }
            OperatorCommand::Unset => {
                let unflagged = self.roster.unflag_selected();
                if unflagged && let Some(record) = self.roster.selected() {
                    self.log.record(&ActivityEvent::unflagged(record));
                }
                Outcome::from_change(unflagged)
            }
            OperatorCommand::Commit => Outcome::from_change(self.commit()),
            OperatorCommand::Clear => {
                let count = self.roster.len();
                let cleared = self.roster.clear();
                if cleared {
                    self.log.record(&ActivityEvent::Cleared { count });
                }
                Outcome::from_change(cleared)
            }
            OperatorCommand::Refresh => Outcome {
                changed: false,
                redraw: true,
            },
        }
    }

    fn after_flag(&mut self, flagged: bool) -> bool {
        if !flagged {
            return false;
        }
        if let Some(record) = self.roster.selected() {
            self.log.record(&ActivityEvent::flagged(record));
        }
        if self.settings.advance_after_flag {
            self.roster.move_by(1);
        }
        true
    }

    fn commit(&mut self) -> bool {
        let report = self
            .roster
            .commit_all(&self.settings.reason, &mut self.executor);
        for action in &report.actions {
            self.log.record(&ActivityEvent::Executed(action.clone()));
        }
        let changed = !report.is_empty();
        self.last_commit = report;
        changed
    }
}

//! Roster activity events and the session-side log handle.
//!
//! The session is single-threaded, so events are converted and written inline.
//! A disabled log accepts events and drops them.

#![allow(missing_docs)]

use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity, WriterState};
use crate::roster::commit::ExecutedAction;
use crate::roster::record::ConnectionRecord;

/// Events that can be logged by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    SessionStarted {
        version: String,
        config_hash: String,
        capacity: usize,
    },
    SessionStopped {
        records: usize,
        pending: usize,
    },
    Connected {
        nick: String,
        user: String,
        address: String,
    },
    Disconnected {
        nick: String,
        address: String,
        status: String,
    },
    Evicted {
        nick: String,
        address: String,
        status: String,
    },
    Flagged {
        nick: String,
        address: String,
        status: String,
    },
    Unflagged {
        nick: String,
        address: String,
        status: String,
    },
    Executed(ExecutedAction),
    Cleared {
        count: usize,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ActivityEvent {
    pub fn connected(record: &ConnectionRecord) -> Self {
        Self::Connected {
            nick: record.nick().to_owned(),
            user: record.user().to_owned(),
            address: record.address().to_owned(),
        }
    }

    pub fn disconnected(record: &ConnectionRecord) -> Self {
        let (nick, address, status) = describe(record);
        Self::Disconnected {
            nick,
            address,
            status,
        }
    }

    pub fn evicted(record: &ConnectionRecord) -> Self {
        let (nick, address, status) = describe(record);
        Self::Evicted {
            nick,
            address,
            status,
        }
    }

    pub fn flagged(record: &ConnectionRecord) -> Self {
        let (nick, address, status) = describe(record);
        Self::Flagged {
            nick,
            address,
            status,
        }
    }

    pub fn unflagged(record: &ConnectionRecord) -> Self {
        let (nick, address, status) = describe(record);
        Self::Unflagged {
            nick,
            address,
            status,
        }
    }

    /// Convert to the on-disk entry shape.
    #[must_use]
    pub fn to_log_entry(&self) -> LogEntry {
        match self {
            Self::SessionStarted {
                version,
                config_hash,
                capacity,
            } => {
                let mut e = LogEntry::new(EventType::SessionStart, Severity::Info);
                e.count = Some(*capacity as u64);
                e.details = Some(format!("version={version} config_hash={config_hash}"));
                e
            }
            Self::SessionStopped { records, pending } => {
                let mut e = LogEntry::new(EventType::SessionStop, Severity::Info);
                e.count = Some(*records as u64);
                if *pending > 0 {
                    e.severity = Severity::Warning;
                    e.details = Some(format!("{pending} flagged records were never committed"));
                }
                e
            }
            Self::Connected {
                nick,
                user,
                address,
            } => {
                let mut e = LogEntry::new(EventType::Connect, Severity::Info);
                e.nick = Some(nick.clone());
                e.user = Some(user.clone());
                e.address = Some(address.clone());
                e
            }
            Self::Disconnected {
                nick,
                address,
                status,
            } => record_entry(EventType::Disconnect, Severity::Info, nick, address, status),
            Self::Evicted {
                nick,
                address,
                status,
            } => {
                // Losing a flag before commit deserves attention.
                let severity = if status.ends_with("_pending") {
                    Severity::Warning
                } else {
                    Severity::Info
                };
                record_entry(EventType::Evict, severity, nick, address, status)
            }
            Self::Flagged {
                nick,
                address,
                status,
            } => record_entry(EventType::Flag, Severity::Info, nick, address, status),
            Self::Unflagged {
                nick,
                address,
                status,
            } => record_entry(EventType::Unflag, Severity::Info, nick, address, status),
            Self::Executed(ExecutedAction::Kill { nick, reason }) => {
                let mut e = LogEntry::new(EventType::Kill, Severity::Warning);
                e.nick = Some(nick.clone());
                e.reason = Some(reason.clone());
                e.status = Some("killed".to_string());
                e
            }
            Self::Executed(ExecutedAction::Akill { address, reason }) => {
                let mut e = LogEntry::new(EventType::Akill, Severity::Warning);
                e.address = Some(address.clone());
                e.reason = Some(reason.clone());
                e.status = Some("akilled".to_string());
                e
            }
            Self::Cleared { count } => {
                let mut e = LogEntry::new(EventType::Clear, Severity::Info);
                e.count = Some(*count as u64);
                e
            }
            Self::Error { code, message } => {
                let mut e = LogEntry::new(EventType::Error, Severity::Critical);
                e.error_code = Some(code.clone());
                e.details = Some(message.clone());
                e
            }
        }
    }
}

fn describe(record: &ConnectionRecord) -> (String, String, String) {
    (
        record.nick().to_owned(),
        record.address().to_owned(),
        record.status().label().to_owned(),
    )
}

fn record_entry(
    event: EventType,
    severity: Severity,
    nick: &str,
    address: &str,
    status: &str,
) -> LogEntry {
    let mut e = LogEntry::new(event, severity);
    e.nick = Some(nick.to_owned());
    e.address = Some(address.to_owned());
    e.status = Some(status.to_owned());
    e
}

/// Session-owned activity log.
pub struct ActivityLog {
    writer: Option<JsonlWriter>,
    events_logged: u64,
}

impl ActivityLog {
    /// A log that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            writer: None,
            events_logged: 0,
        }
    }

    pub fn open(config: JsonlConfig) -> Self {
        Self {
            writer: Some(JsonlWriter::open(config)),
            events_logged: 0,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Where lines are going; `None` when disabled.
    #[must_use]
    pub fn writer_state(&self) -> Option<WriterState> {
        self.writer.as_ref().map(JsonlWriter::state)
    }

    /// Events handed to the writer so far.
    #[must_use]
    pub const fn events_logged(&self) -> u64 {
        self.events_logged
    }

    pub fn record(&mut self, event: &ActivityEvent) {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_entry(&event.to_log_entry());
            self.events_logged += 1;
        }
    }

    /// Flush buffered lines and sync them to disk.
    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            writer.sync();
        }
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::disabled()
    }
}

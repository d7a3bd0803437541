//! Server-notice parsing.
//!
//! Recognized shapes (anything may precede the marker, e.g. a log prefix or
//! `*** Notice --`):
//!
//! ```text
//! [<timestamp>] ... Client connecting: <nick> (<user>@<host>) [<ip>] ...
//! [<timestamp>] ... Client exiting: <nick> (<user>@<host>) [<ip>] ...
//! ```
//!
//! The leading timestamp is optional (`YYYY-MM-DD HH:MM:SS` or RFC 3339); when
//! absent or unparseable, the caller's fallback time is used.

#![allow(missing_docs)]

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::core::config::FeedConfig;
use crate::core::errors::{ConlistError, Result};
use crate::roster::record::{ConnectionRecord, DisconnectKey};

/// A connect or disconnect observed in the host feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Connect {
        at: DateTime<Utc>,
        nick: String,
        user: String,
        host: String,
        address: String,
    },
    Disconnect {
        at: DateTime<Utc>,
        nick: String,
        key: DisconnectKey,
    },
}

impl HostEvent {
    #[must_use]
    pub fn nick(&self) -> &str {
        match self {
            Self::Connect { nick, .. } | Self::Disconnect { nick, .. } => nick,
        }
    }

    /// Record for a connect event; `None` for a disconnect.
    #[must_use]
    pub fn to_record(&self) -> Option<ConnectionRecord> {
        match self {
            Self::Connect {
                at,
                nick,
                user,
                address,
                ..
            } => Some(ConnectionRecord::new(
                *at,
                nick.as_str(),
                user.as_str(),
                address.as_str(),
            )),
            Self::Disconnect { .. } => None,
        }
    }
}

/// Compiled matchers for one pair of connect/exit markers.
#[derive(Debug, Clone)]
pub struct FeedParser {
    connect: Regex,
    exit: Regex,
}

static DEFAULT_PARSER: LazyLock<Option<FeedParser>> =
    LazyLock::new(|| FeedParser::new(&FeedConfig::default()).ok());

impl FeedParser {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Ok(Self {
            connect: notice_regex(&config.connect_marker)?,
            exit: notice_regex(&config.exit_marker)?,
        })
    }

    /// Parse one feed line. Lines that are not well-formed notices yield `None`.
    #[must_use]
    pub fn parse_line(&self, line: &str, fallback: DateTime<Utc>) -> Option<HostEvent> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(caps) = self.connect.captures(line) {
            return Some(HostEvent::Connect {
                at: timestamp(caps.name("ts").map(|m| m.as_str()), fallback),
                nick: caps["nick"].to_owned(),
                user: caps["user"].to_owned(),
                host: caps["host"].to_owned(),
                address: caps["ip"].to_owned(),
            });
        }

        let caps = self.exit.captures(line)?;
        Some(HostEvent::Disconnect {
            at: timestamp(caps.name("ts").map(|m| m.as_str()), fallback),
            nick: caps["nick"].to_owned(),
            key: DisconnectKey::new(&caps["user"], &caps["ip"]),
        })
    }
}

/// Parse with the default markers.
#[must_use]
pub fn parse_line(line: &str, fallback: DateTime<Utc>) -> Option<HostEvent> {
    DEFAULT_PARSER.as_ref()?.parse_line(line, fallback)
}

fn notice_regex(marker: &str) -> Result<Regex> {
    let pattern = format!(
        r"^(?:(?P<ts>\d{{4}}-\d{{2}}-\d{{2}}[ T]\d{{2}}:\d{{2}}:\d{{2}}\S*)\s+)?.*?{marker}: (?P<nick>[^\s()]+) \((?P<user>[^\s@()]+)@(?P<host>[^\s()]+)\) \[(?P<ip>[0-9A-Fa-f.:]+)\]",
        marker = regex::escape(marker.trim()),
    );
    Regex::new(&pattern).map_err(|err| ConlistError::InvalidConfig {
        details: format!("feed marker {marker:?} does not compile: {err}"),
    })
}

fn timestamp(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return fallback;
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map_or(fallback, |naive| naive.and_utc())
}

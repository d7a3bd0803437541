//! One tracked client connection and its moderation status.
//!
//! Status changes go through [`Status::apply`], a closed transition table.
//! Every operation reports whether it changed anything; nothing here fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roster::commit::{ActionExecutor, ExecutedAction};

// ──────────────────── status machine ────────────────────

/// Moderation status of a connection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Client is connected and unflagged.
    Online,
    /// Client has disconnected and is unflagged.
    Offline,
    /// Flagged for KILL, waiting for commit.
    KillPending,
    /// Flagged for AKILL (network ban), waiting for commit.
    AkillPending,
    /// KILL issued. Terminal.
    Killed,
    /// AKILL issued. Terminal.
    Akilled,
}

/// Inputs that drive the status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The client left the network.
    Disconnect,
    /// Operator flagged the record for KILL.
    FlagKill,
    /// Operator flagged the record for AKILL.
    FlagAkill,
    /// Operator dropped a pending flag.
    Unflag,
    /// Pending flags are being carried out.
    Commit,
}

impl Status {
    /// Unflagged status implied by the connection state.
    #[must_use]
    pub const fn resting(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }

    /// `killed` and `akilled` accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Killed | Self::Akilled)
    }

    /// Flagged and waiting for commit.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::KillPending | Self::AkillPending)
    }

    /// Short label used in listings and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::KillPending => "kill_pending",
            Self::AkillPending => "akill_pending",
            Self::Killed => "killed",
            Self::Akilled => "akilled",
        }
    }

    /// Next status for `transition`, or `None` when the transition is a no-op.
    ///
    /// `online` is the record's connection state *after* the transition.
    #[must_use]
    pub const fn apply(self, transition: Transition, online: bool) -> Option<Self> {
        match (self, transition) {
            (Self::Killed | Self::Akilled, _) => None,

            (
                Self::Online | Self::KillPending | Self::AkillPending,
                Transition::Disconnect,
            ) => Some(Self::Offline),
            (Self::Offline, Transition::Disconnect) => None,

            (Self::Online | Self::Offline | Self::AkillPending, Transition::FlagKill) => {
                Some(Self::KillPending)
            }
            (Self::KillPending, Transition::FlagKill) => None,

            (Self::Online | Self::Offline | Self::KillPending, Transition::FlagAkill) => {
                Some(Self::AkillPending)
            }
            (Self::AkillPending, Transition::FlagAkill) => None,

            (Self::KillPending | Self::AkillPending, Transition::Unflag) => {
                Some(Self::resting(online))
            }
            (Self::Online | Self::Offline, Transition::Unflag) => None,

            (Self::KillPending, Transition::Commit) => Some(Self::Killed),
            (Self::AkillPending, Transition::Commit) => Some(Self::Akilled),
            (Self::Online | Self::Offline, Transition::Commit) => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ──────────────────── policies ────────────────────

/// Whether a client that already left may still be flagged for a plain KILL.
///
/// A KILL targets a connected nick, so the default refuses it. AKILL is
/// address-based and is always allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfflineKillPolicy {
    /// Flagging an offline record for KILL does nothing.
    #[default]
    Refuse,
    /// Offline records may be flagged for KILL.
    Allow,
}

/// Which fields correlate a disconnect to an earlier connect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    /// Both the user (ident) and the address must match.
    #[default]
    UserAddress,
    /// The address alone.
    Address,
}

/// Correlation fields carried by a disconnect event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectKey {
    /// Username (ident) reported by the exit notice.
    pub user: String,
    /// Host address reported by the exit notice.
    pub address: String,
}

impl DisconnectKey {
    /// Key for the client `user` at `address`.
    pub fn new(user: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            address: address.into(),
        }
    }
}

// ──────────────────── record ────────────────────

/// A single client connection observed on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    connected_at: DateTime<Utc>,
    nick: String,
    user: String,
    address: String,
    online: bool,
    status: Status,
}

impl ConnectionRecord {
    /// A freshly connected, unflagged client.
    pub fn new(
        connected_at: DateTime<Utc>,
        nick: impl Into<String>,
        user: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            connected_at,
            nick: nick.into(),
            user: user.into(),
            address: address.into(),
            online: true,
            status: Status::Online,
        }
    }

    /// When the connect notice was seen.
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Nickname at connect time.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Username (ident).
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Host address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// `false` once a matching disconnect was seen.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.online
    }

    /// Current moderation status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Whether this record is the connection a disconnect refers to.
    #[must_use]
    pub fn matches(&self, key: &DisconnectKey, mode: MatchKey) -> bool {
        match mode {
            MatchKey::UserAddress => self.user == key.user && self.address == key.address,
            MatchKey::Address => self.address == key.address,
        }
    }

    /// Flag for KILL. Returns `true` if the status changed.
    pub fn flag_kill(&mut self, policy: OfflineKillPolicy) -> bool {
        if !self.online && policy == OfflineKillPolicy::Refuse {
            return false;
        }
        self.transition(Transition::FlagKill)
    }

    /// Flag for AKILL. Returns `true` if the status changed.
    pub fn flag_akill(&mut self) -> bool {
        self.transition(Transition::FlagAkill)
    }

    /// Drop a pending flag. Terminal records are left alone.
    pub fn unflag(&mut self) -> bool {
        self.transition(Transition::Unflag)
    }

    /// Record that the client left. Returns `true` if the record was online.
    ///
    /// A pending flag is dropped and the record becomes `offline`; terminal
    /// records keep their status.
    pub fn mark_disconnected(&mut self) -> bool {
        if !self.online {
            return false;
        }
        self.online = false;
        self.transition(Transition::Disconnect);
        true
    }

    /// Carry out a pending flag through `executor`.
    ///
    /// Returns the action issued, or `None` when nothing was pending.
    pub fn commit(
        &mut self,
        reason: &str,
        executor: &mut dyn ActionExecutor,
    ) -> Option<ExecutedAction> {
        let action = match self.status {
            Status::KillPending => {
                executor.kill(&self.nick, reason);
                ExecutedAction::Kill {
                    nick: self.nick.clone(),
                    reason: reason.to_owned(),
                }
            }
            Status::AkillPending => {
                executor.akill(&self.address, reason);
                ExecutedAction::Akill {
                    address: self.address.clone(),
                    reason: reason.to_owned(),
                }
            }
            Status::Online | Status::Offline | Status::Killed | Status::Akilled => return None,
        };
        self.transition(Transition::Commit);
        Some(action)
    }

    fn transition(&mut self, transition: Transition) -> bool {
        match self.status.apply(transition, self.online) {
            Some(next) => {
                self.status = next;
                true
            }
            None => false,
        }
    }
}

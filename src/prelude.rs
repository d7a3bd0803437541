//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use conlist::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{ConlistError, Result};

// Roster
pub use crate::roster::commit::{ActionExecutor, CommitReport, ExecutedAction};
pub use crate::roster::pagination::{Window, visible_window};
pub use crate::roster::record::{
    ConnectionRecord, DisconnectKey, MatchKey, OfflineKillPolicy, Status,
};
pub use crate::roster::store::{Roster, RosterEntry};

// Adapters
pub use crate::actions::{CommandScriptExecutor, CommandTemplate, RecordingExecutor};
pub use crate::feed::{FeedParser, HostEvent};
pub use crate::logger::{ActivityEvent, ActivityLog};

// Session
pub use crate::session::{LineOutcome, OperatorCommand, Outcome, Session, SessionSettings};
pub use crate::view::{DisplayLine, RenderHint};

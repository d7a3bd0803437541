//! Two-phase flag/commit protocol.
//!
//! Flags only mark records. [`commit_records`] walks the roster in insertion
//! order and hands each pending record to an [`ActionExecutor`]; every
//! affected record ends in a terminal status, so a second pass issues nothing.

use serde::Serialize;

use crate::roster::record::ConnectionRecord;

/// Host collaborator that carries out punitive actions.
///
/// Calls are fire-and-forget: the roster does not observe the result.
pub trait ActionExecutor {
    /// Disconnect a connected nick.
    fn kill(&mut self, nick: &str, reason: &str);
    /// Ban an address network-wide.
    fn akill(&mut self, address: &str, reason: &str);
}

impl<T: ActionExecutor + ?Sized> ActionExecutor for Box<T> {
    fn kill(&mut self, nick: &str, reason: &str) {
        (**self).kill(nick, reason);
    }

    fn akill(&mut self, address: &str, reason: &str) {
        (**self).akill(address, reason);
    }
}

/// An action handed to the executor during commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ExecutedAction {
    Kill { nick: String, reason: String },
    Akill { address: String, reason: String },
}

/// What a commit pass did, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub actions: Vec<ExecutedAction>,
}

impl CommitReport {
    /// Nothing was pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[must_use]
    pub fn kills(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, ExecutedAction::Kill { .. }))
            .count()
    }

    #[must_use]
    pub fn akills(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, ExecutedAction::Akill { .. }))
            .count()
    }
}

/// Commit every pending record, in iteration order.
pub fn commit_records<'a, I>(
    records: I,
    reason: &str,
    executor: &mut dyn ActionExecutor,
) -> CommitReport
where
    I: IntoIterator<Item = &'a mut ConnectionRecord>,
{
    let actions = records
        .into_iter()
        .filter_map(|record| record.commit(reason, &mut *executor))
        .collect();
    CommitReport { actions }
}

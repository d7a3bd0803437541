//! In-memory executor.

use crate::roster::commit::{ActionExecutor, ExecutedAction};

/// Collects every action it is asked to perform, in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingExecutor {
    pub actions: Vec<ExecutedAction>,
}

impl RecordingExecutor {
    /// Drain recorded actions.
    pub fn take(&mut self) -> Vec<ExecutedAction> {
        std::mem::take(&mut self.actions)
    }
}

impl ActionExecutor for RecordingExecutor {
    fn kill(&mut self, nick: &str, reason: &str) {
        self.actions.push(ExecutedAction::Kill {
            nick: nick.to_owned(),
            reason: reason.to_owned(),
        });
    }

    fn akill(&mut self, address: &str, reason: &str) {
        self.actions.push(ExecutedAction::Akill {
            address: address.to_owned(),
            reason: reason.to_owned(),
        });
    }
}

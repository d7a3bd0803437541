//! Concrete [`ActionExecutor`](crate::roster::commit::ActionExecutor) implementations.
//!
//! - [`CommandScriptExecutor`] renders services commands for the host client.
//! - [`RecordingExecutor`] keeps actions in memory (dry runs and tests).

pub mod recording;
pub mod script;

pub use recording::RecordingExecutor;
pub use script::{CommandScriptExecutor, CommandTemplate};

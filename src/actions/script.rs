//! Services command rendering.
//!
//! Each action becomes one command line the host client can execute verbatim:
//!
//! ```text
//! /kill <nick> <reason>
//! /os AKILL ADD <mask> !T <duration> <reason>
//! ```
//!
//! Writes are fire-and-forget. A failed write is counted and reported on
//! stderr, never surfaced to the roster.

#![allow(missing_docs)]

use std::io::{self, Write};

use crate::core::config::ActionsConfig;
use crate::roster::commit::ActionExecutor;

/// Ban mask and expiry applied to AKILLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Mask template; `{address}` is replaced with the client address.
    pub akill_mask: String,
    pub akill_duration: String,
}

impl Default for CommandTemplate {
    fn default() -> Self {
        Self::from_config(&ActionsConfig::default())
    }
}

impl CommandTemplate {
    #[must_use]
    pub fn from_config(config: &ActionsConfig) -> Self {
        Self {
            akill_mask: config.akill_mask.clone(),
            akill_duration: config.akill_duration.clone(),
        }
    }

    #[must_use]
    pub fn kill_command(&self, nick: &str, reason: &str) -> String {
        format!("/kill {nick} {}", single_line(reason))
    }

    #[must_use]
    pub fn akill_command(&self, address: &str, reason: &str) -> String {
        let mask = self.akill_mask.replace("{address}", address);
        format!(
            "/os AKILL ADD {mask} !T {} {}",
            self.akill_duration,
            single_line(reason)
        )
    }
}

/// Emits one services command per action to a writer.
pub struct CommandScriptExecutor<W: Write> {
    out: W,
    template: CommandTemplate,
    commands_written: u64,
    write_failures: u64,
}

impl<W: Write> CommandScriptExecutor<W> {
    pub fn new(out: W, template: CommandTemplate) -> Self {
        Self {
            out,
            template,
            commands_written: 0,
            write_failures: 0,
        }
    }

    #[must_use]
    pub const fn commands_written(&self) -> u64 {
        self.commands_written
    }

    /// Commands that could not be written to the sink.
    #[must_use]
    pub const fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) {
        let result = writeln!(self.out, "{line}").and_then(|()| self.out.flush());
        match result {
            Ok(()) => self.commands_written += 1,
            Err(e) => {
                self.write_failures += 1;
                let _ = writeln!(io::stderr(), "[CL-ACTION] failed to emit {line:?}: {e}");
            }
        }
    }
}

impl<W: Write> ActionExecutor for CommandScriptExecutor<W> {
    fn kill(&mut self, nick: &str, reason: &str) {
        let line = self.template.kill_command(nick, reason);
        self.emit(&line);
    }

    fn akill(&mut self, address: &str, reason: &str) {
        let line = self.template.akill_command(address, reason);
        self.emit(&line);
    }
}

/// Line breaks in a reason would smuggle extra commands into the host.
fn single_line(reason: &str) -> String {
    reason
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

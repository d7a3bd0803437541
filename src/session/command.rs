//! Operator command tokens.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

/// Leading word hosts use to route a typed line to conlist.
pub const COMMAND_PREFIX: &str = "/icl";

/// One operator action, mapped one-to-one onto roster operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCommand {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Kill,
    Akill,
    Unset,
    Commit,
    Clear,
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub token: &'static str,
    pub description: &'static str,
}

const HELP_BINDINGS: &[HelpBinding] = &[
    HelpBinding {
        token: "up",
        description: "Select the previous connection",
    },
    HelpBinding {
        token: "down",
        description: "Select the next connection",
    },
    HelpBinding {
        token: "pageup",
        description: "Move up one screen",
    },
    HelpBinding {
        token: "pagedown",
        description: "Move down one screen",
    },
    HelpBinding {
        token: "home",
        description: "Jump to the oldest connection",
    },
    HelpBinding {
        token: "end",
        description: "Jump to the newest connection",
    },
    HelpBinding {
        token: "kill",
        description: "Flag the selection for KILL",
    },
    HelpBinding {
        token: "akill",
        description: "Flag the selection for AKILL",
    },
    HelpBinding {
        token: "unset",
        description: "Remove the selection's pending flag",
    },
    HelpBinding {
        token: "commit",
        description: "Execute every pending flag",
    },
    HelpBinding {
        token: "clear",
        description: "Forget all tracked connections",
    },
    HelpBinding {
        token: "refresh",
        description: "Redraw the list",
    },
];

#[must_use]
pub const fn help_bindings() -> &'static [HelpBinding] {
    HELP_BINDINGS
}

impl OperatorCommand {
    pub const ALL: [Self; 12] = [
        Self::Up,
        Self::Down,
        Self::PageUp,
        Self::PageDown,
        Self::Home,
        Self::End,
        Self::Kill,
        Self::Akill,
        Self::Unset,
        Self::Commit,
        Self::Clear,
        Self::Refresh,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::PageUp => "pageup",
            Self::PageDown => "pagedown",
            Self::Home => "home",
            Self::End => "end",
            Self::Kill => "kill",
            Self::Akill => "akill",
            Self::Unset => "unset",
            Self::Commit => "commit",
            Self::Clear => "clear",
            Self::Refresh => "refresh",
        }
    }

    /// Commands that can change roster state.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::Kill | Self::Akill | Self::Unset | Self::Commit | Self::Clear
        )
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("unexpected arguments after {command}: {rest:?}")]
    TrailingArguments { command: &'static str, rest: String },
}

impl FromStr for OperatorCommand {
    type Err = ParseCommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut words = input.split_whitespace();
        let mut first = words.next().ok_or(ParseCommandError::Empty)?;
        if first.eq_ignore_ascii_case(COMMAND_PREFIX) {
            first = words.next().ok_or(ParseCommandError::Empty)?;
        }

        let command = Self::ALL
            .into_iter()
            .find(|c| c.token().eq_ignore_ascii_case(first))
            .ok_or_else(|| ParseCommandError::Unknown(first.to_owned()))?;

        let rest: Vec<&str> = words.collect();
        if !rest.is_empty() {
            return Err(ParseCommandError::TrailingArguments {
                command: command.token(),
                rest: rest.join(" "),
            });
        }
        Ok(command)
    }
}

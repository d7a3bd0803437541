//! CL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, ConlistError>;

/// Top-level error type for conlist.
///
/// The roster itself never fails; these cover the layers around it
/// (configuration, the activity log, CLI I/O).
#[derive(Debug, Error)]
pub enum ConlistError {
    #[error("[CL-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CL-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CL-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CL-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CL-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CL-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl ConlistError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CL-1001",
            Self::MissingConfig { .. } => "CL-1002",
            Self::ConfigParse { .. } => "CL-1003",
            Self::Serialization { .. } => "CL-2101",
            Self::Io { .. } => "CL-3002",
            Self::Runtime { .. } => "CL-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for ConlistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for ConlistError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ConlistError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

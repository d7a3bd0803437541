//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::core::errors::{ConlistError, Result};
use crate::roster::record::{MatchKey, OfflineKillPolicy};
use crate::roster::store::DEFAULT_CAPACITY;

/// Full conlist configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub roster: RosterConfig,
    pub actions: ActionsConfig,
    pub feed: FeedConfig,
    pub display: DisplayConfig,
    pub paths: PathsConfig,
}

/// Roster capacity and correlation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RosterConfig {
    /// Maximum records kept; the oldest is evicted beyond this.
    pub capacity: usize,
    /// Fields used to pair a disconnect with its connect.
    pub match_key: MatchKey,
    /// Whether a client that already left may be flagged for KILL.
    pub offline_kill: OfflineKillPolicy,
    /// Move the cursor down one line after a successful flag.
    pub advance_after_flag: bool,
}

/// How committed actions are rendered for the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActionsConfig {
    /// Reason attached to every KILL/AKILL.
    pub reason: String,
    /// AKILL expiry in services syntax, e.g. `1h`, `30m`, `7d`.
    pub akill_duration: String,
    /// Ban mask template; `{address}` is replaced with the client address.
    pub akill_mask: String,
    /// Record actions without emitting host commands.
    pub dry_run: bool,
}

/// Server-notice markers recognized in the host feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeedConfig {
    pub connect_marker: String,
    pub exit_marker: String,
}

/// Display defaults used when the host cannot report a viewport height.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_height: usize,
    /// `chrono` strftime pattern for the connect timestamp column.
    pub timestamp_format: String,
}

/// Filesystem paths used by conlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// Activity log; an empty path disables it.
    pub jsonl_log: PathBuf,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            match_key: MatchKey::default(),
            offline_kill: OfflineKillPolicy::default(),
            advance_after_flag: true,
        }
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            reason: "Drones".to_string(),
            akill_duration: "1h".to_string(),
            akill_mask: "*@{address}".to_string(),
            dry_run: false,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            connect_marker: "Client connecting".to_string(),
            exit_marker: "Client exiting".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_height: 24,
            timestamp_format: "%H:%M:%S".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[CL-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("conlist").join("config.toml");
        let data = home_dir.join(".local").join("share").join("conlist");
        Self {
            config_file: cfg,
            jsonl_log: data.join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| ConlistError::io(&path_buf, source))?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(ConlistError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for log correlation (FNV-1a).
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // roster
        if let Some(raw) = lookup("CONLIST_ROSTER_CAPACITY") {
            self.roster.capacity = parse_env("CONLIST_ROSTER_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("CONLIST_ROSTER_MATCH_KEY") {
            self.roster.match_key = parse_env_enum("CONLIST_ROSTER_MATCH_KEY", &raw)?;
        }
        if let Some(raw) = lookup("CONLIST_ROSTER_OFFLINE_KILL") {
            self.roster.offline_kill = parse_env_enum("CONLIST_ROSTER_OFFLINE_KILL", &raw)?;
        }
        if let Some(raw) = lookup("CONLIST_ROSTER_ADVANCE_AFTER_FLAG") {
            self.roster.advance_after_flag =
                parse_env("CONLIST_ROSTER_ADVANCE_AFTER_FLAG", &raw)?;
        }

        // actions
        if let Some(raw) = lookup("CONLIST_ACTIONS_REASON") {
            self.actions.reason = raw;
        }
        if let Some(raw) = lookup("CONLIST_ACTIONS_AKILL_DURATION") {
            self.actions.akill_duration = raw.trim().to_string();
        }
        if let Some(raw) = lookup("CONLIST_ACTIONS_AKILL_MASK") {
            self.actions.akill_mask = raw.trim().to_string();
        }
        if let Some(raw) = lookup("CONLIST_ACTIONS_DRY_RUN") {
            self.actions.dry_run = parse_env("CONLIST_ACTIONS_DRY_RUN", &raw)?;
        }

        // display
        if let Some(raw) = lookup("CONLIST_DISPLAY_DEFAULT_HEIGHT") {
            self.display.default_height = parse_env("CONLIST_DISPLAY_DEFAULT_HEIGHT", &raw)?;
        }

        // paths
        if let Some(raw) = lookup("CONLIST_PATHS_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.roster.capacity == 0 {
            return Err(ConlistError::InvalidConfig {
                details: "roster.capacity must be >= 1".to_string(),
            });
        }
        if self.display.default_height == 0 {
            return Err(ConlistError::InvalidConfig {
                details: "display.default_height must be >= 1".to_string(),
            });
        }
        if !is_strftime_pattern(&self.display.timestamp_format) {
            return Err(ConlistError::InvalidConfig {
                details: format!(
                    "display.timestamp_format is not a valid strftime pattern: {:?}",
                    self.display.timestamp_format
                ),
            });
        }

        let reason = &self.actions.reason;
        if reason.trim().is_empty() || reason.contains(['\r', '\n']) {
            return Err(ConlistError::InvalidConfig {
                details: "actions.reason must be a non-empty single line".to_string(),
            });
        }

        if !is_services_duration(&self.actions.akill_duration) {
            return Err(ConlistError::InvalidConfig {
                details: format!(
                    "actions.akill_duration must look like <n>[smhdw], got {:?}",
                    self.actions.akill_duration
                ),
            });
        }

        if !self.actions.akill_mask.contains("{address}") {
            return Err(ConlistError::InvalidConfig {
                details: "actions.akill_mask must contain {address}".to_string(),
            });
        }

        if self.feed.connect_marker.trim().is_empty() || self.feed.exit_marker.trim().is_empty() {
            return Err(ConlistError::InvalidConfig {
                details: "feed.connect_marker and feed.exit_marker must be non-empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Every specifier in `fmt` is one `chrono` can render.
fn is_strftime_pattern(fmt: &str) -> bool {
    !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}

/// `0` (permanent) or digits followed by one of `s m h d w`.
fn is_services_duration(raw: &str) -> bool {
    if raw == "0" {
        return true;
    }
    let Some(unit) = raw.chars().last() else {
        return false;
    };
    let digits = &raw[..raw.len() - unit.len_utf8()];
    matches!(unit, 's' | 'm' | 'h' | 'd' | 'w')
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|error| ConlistError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

/// Parse a snake_case enum value the same way the TOML file spells it.
fn parse_env_enum<T>(name: &str, raw: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::String(raw.trim().to_ascii_lowercase());
    serde_json::from_value(value).map_err(|error| ConlistError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

#![forbid(unsafe_code)]

//! conlist: an interactive connection list for chat network operators.
//!
//! Tracks client connects and disconnects in a bounded roster, lets an
//! operator page through recent connections, flag entries for KILL or AKILL,
//! and commit every pending flag in one batch.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use conlist::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use conlist::core::config::Config;
//! use conlist::roster::store::Roster;
//! ```

pub mod prelude;

pub mod actions;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod feed;
pub mod logger;
pub mod roster;
pub mod session;
pub mod view;

//! Activity logging: roster events as append-only JSONL with graceful degradation.

pub mod activity;
pub mod jsonl;

pub use activity::{ActivityEvent, ActivityLog};

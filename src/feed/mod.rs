//! Host feed adapter: turns server notices into connect/disconnect events.

pub mod parser;

pub use parser::{FeedParser, HostEvent, parse_line};

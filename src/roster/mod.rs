//! The connection roster: records, cursor, pagination and the commit protocol.
//!
//! Everything in this module is deterministic and free of I/O. Host
//! collaborators plug in through [`commit::ActionExecutor`].

pub mod commit;
pub mod pagination;
pub mod record;
pub mod store;

#[cfg(test)]
mod test_properties;

//! Terminal-facing pieces of the `conlist` binary.
#![allow(missing_docs)]

pub mod screen;

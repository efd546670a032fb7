#![warn(missing_docs)]
//! Benchpipe IPC
//!
//! The text protocol that carries a benchmark-run descriptor into a compiled
//! artifact and back. The format is deliberately rigid: exactly three
//! non-empty lines with fixed keyword prefixes, so a malformed descriptor is
//! always a hard failure and never a silently-defaulted run.

mod descriptor;

pub use descriptor::{
    parse, read_descriptor, serialize, write_descriptor, DescriptorError,
};

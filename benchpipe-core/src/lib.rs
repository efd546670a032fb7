#![warn(missing_docs)]
//! Benchpipe Core
//!
//! This crate provides the building blocks the rest of the pipeline depends on:
//! - the benchmark data model (`BenchmarkConfiguration`, `BenchmarkRun`,
//!   `BenchmarkProfile`, `Platform`, `StageKind`)
//! - locale-independent decimal formatting used by the measurement runtime
//! - scoped text-file access with errors that carry the offending path

mod format;
mod fs;
mod model;

pub use format::format_decimal;
pub use fs::{read_all, write_all, FileError};
pub use model::{
    upper_first, BenchmarkConfiguration, BenchmarkProfile, BenchmarkRun, Platform, StageKind,
};

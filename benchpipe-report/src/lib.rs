#![warn(missing_docs)]
//! Benchpipe Report
//!
//! Data structures for benchmark results and their machine-readable JSON
//! serialization. A report file is a JSON array of results in execution
//! order — nothing else is ever written into it.

mod json;
mod report;

pub use json::{generate_json_report, parse_json_report};
pub use report::ReportBenchmarkResult;

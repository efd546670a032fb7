#![warn(missing_docs)]
//! # Benchpipe
//!
//! Multi-target benchmark build pipeline: for each (profile, platform) pair it
//! generates driver sources from benchmark declarations, compiles a benchmark
//! variant, and executes the artifact to collect a report.
//!
//! - **Three-stage chains**: Generate → Compile → Execute, declared as a task
//!   graph; independent pairs run concurrently, stages of one pair in order
//! - **Backend strategies**: managed runtimes, script interpreters, and native
//!   toolchains behind one dispatch point
//! - **Descriptor protocol**: a three-line text format handing the benchmark
//!   name, configuration, and parameters to the artifact
//! - **Report protocol**: JSON result arrays, published atomically, with
//!   optional sentinel markers separating progress output from the payload
//!
//! ## Quick Start
//!
//! ```ignore
//! use benchpipe::{PipelineOrchestrator, TargetBackend, UpstreamCompilation};
//!
//! let mut orchestrator = PipelineOrchestrator::new("build/benchmarks", None);
//! orchestrator.register(&profile, &backend, &upstream)?;
//! let outcomes = orchestrator.run(4)?;
//! ```

// Re-export core types
pub use benchpipe_core::{
    format_decimal, read_all, upper_first, write_all, BenchmarkConfiguration, BenchmarkProfile,
    BenchmarkRun, FileError, Platform, StageKind,
};

// Re-export the descriptor protocol
pub use benchpipe_ipc::{parse, read_descriptor, serialize, write_descriptor, DescriptorError};

// Re-export the report protocol
pub use benchpipe_report::{generate_json_report, parse_json_report, ReportBenchmarkResult};

// Re-export pipeline types
pub use benchpipe_pipeline::{
    BuildLayout, ExecError, GraphError, ManagedRuntime, NativeToolchain, PipelineOrchestrator,
    ProcessExecutor, RegisteredTasks, ScriptRuntime, TargetBackend, TaskGraph, TaskOutcome,
    TaskStatus, UpstreamCompilation, BEGIN_REPORT_MARKER, END_REPORT_MARKER,
};

// Re-export configuration
pub use benchpipe_cli::{PipelineConfig, PlatformEntry, ProfileEntry};

/// Run the Benchpipe CLI harness.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() {
///     benchpipe::run().unwrap();
/// }
/// ```
pub use benchpipe_cli::run;

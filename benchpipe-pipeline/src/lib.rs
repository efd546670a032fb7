#![warn(missing_docs)]
//! Benchpipe Pipeline
//!
//! Orchestrates the per-target benchmark task chain:
//!
//! ```text
//! declarations + compiled outputs
//!        │
//!        ▼
//!    Generate  ──►  Compile  ──►  Execute  ──►  reports/<profile>.json
//! ```
//!
//! The chain is declared as nodes and edges of an in-process [`TaskGraph`];
//! independent (profile, platform) pairs carry no edges between each other and
//! run concurrently, while the stages of one pair always run in order.
//! Backend-specific behavior (managed runtime, script runtime, native
//! toolchain) lives behind the [`TargetBackend`] strategy variants, and
//! artifact invocation with output capture is handled by [`ProcessExecutor`].

mod backend;
mod executor;
mod graph;
mod orchestrator;

pub use backend::{
    BuildLayout, ManagedRuntime, NativeToolchain, ScriptRuntime, TargetBackend,
};
pub use executor::{ExecError, ProcessExecutor, BEGIN_REPORT_MARKER, END_REPORT_MARKER};
pub use graph::{GraphError, TaskGraph, TaskOutcome, TaskStatus};
pub use orchestrator::{PipelineOrchestrator, RegisteredTasks, UpstreamCompilation};

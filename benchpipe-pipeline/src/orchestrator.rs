//! Pipeline Orchestration
//!
//! Wires the Generate → Compile → Execute chain into the task graph for each
//! (profile, backend) pair. The orchestrator only declares nodes and edges —
//! scheduling is the graph's job — and every output directory it names is
//! namespaced by profile name and platform prefix so concurrent pairs cannot
//! interfere.

use crate::backend::{BuildLayout, TargetBackend};
use crate::executor::ProcessExecutor;
use crate::graph::{GraphError, TaskGraph, TaskOutcome};
use anyhow::Context;
use benchpipe_core::{upper_first, BenchmarkProfile, BenchmarkRun, StageKind};
use benchpipe_ipc::write_descriptor;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// The platform's normal compilation that a Generate stage builds on: its
/// output directory feeds the generator, and its task (when the host build
/// declares one) becomes an upstream dependency edge.
#[derive(Debug, Clone)]
pub struct UpstreamCompilation {
    /// Task id of the platform's compilation, if it participates in the graph.
    pub task_id: Option<String>,
    /// Compiled-output directory of the benchmark source set.
    pub output_dir: PathBuf,
}

/// Task ids registered for one (profile, backend) pair, for external tools
/// that depend on stages by name.
#[derive(Debug, Clone)]
pub struct RegisteredTasks {
    /// `<base>Generate`
    pub generate: String,
    /// `<base>Benchmark`
    pub compile: String,
    /// `<base>BenchmarkExec`
    pub execute: String,
    /// Where the Execute stage publishes the report.
    pub report_file: PathBuf,
}

/// Declares benchmark pipelines into a task graph.
pub struct PipelineOrchestrator {
    build_root: PathBuf,
    executor: ProcessExecutor,
    graph: TaskGraph,
}

impl PipelineOrchestrator {
    /// Orchestrator writing per-profile subtrees under `build_root`, with an
    /// optional execution timeout applied to every external process.
    pub fn new(build_root: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            build_root: build_root.into(),
            executor: ProcessExecutor::new(timeout),
            graph: TaskGraph::new(),
        }
    }

    /// Register the three-stage chain for one (profile, backend) pair.
    ///
    /// Task ids are deterministic (`<platformPrefix><ProfileName>` + stage
    /// suffix); registering the same pair twice fails with a duplicate-task
    /// error.
    pub fn register(
        &mut self,
        profile: &BenchmarkProfile,
        backend: &TargetBackend,
        upstream: &UpstreamCompilation,
    ) -> Result<RegisteredTasks, GraphError> {
        let platform = backend.platform();
        let base = format!("{}{}", platform.task_prefix(), upper_first(&profile.name));
        let generate_id = format!("{base}{}", StageKind::Generate.task_suffix());
        let compile_id = format!("{base}{}", StageKind::Compile.task_suffix());
        let execute_id = format!("{base}{}", StageKind::Execute.task_suffix());

        let layout = BuildLayout::new(&self.build_root, &profile.name, &platform.task_prefix());
        let report_file = layout.report_file(&profile.name, backend.report_extension());

        debug!(
            profile = %profile.name,
            platform = %platform,
            build_dir = %layout.root().display(),
            "registering benchmark pipeline"
        );

        // Generate: declarations + compiled outputs -> driver sources.
        {
            let executor = self.executor.clone();
            let backend = backend.clone();
            let layout = layout.clone();
            let input_classes = upstream.output_dir.clone();
            let profile_name = profile.name.clone();
            let platform = platform.clone();
            self.graph.add_task(
                generate_id.clone(),
                Box::new(move || {
                    fs::create_dir_all(layout.sources())?;
                    fs::create_dir_all(layout.resources())?;
                    let output = executor
                        .run(backend.generate_command(&layout, &input_classes))
                        .with_context(|| {
                            format!("Generate stage for '{profile_name}' on {platform}")
                        })?;
                    if !output.is_empty() {
                        debug!(generator_output = %output.trim_end());
                    }
                    Ok(())
                }),
            )?;
        }

        // Compile: benchmark variant with the generated source root.
        {
            let executor = self.executor.clone();
            let backend = backend.clone();
            let layout = layout.clone();
            let input_classes = upstream.output_dir.clone();
            let profile_name = profile.name.clone();
            let platform = platform.clone();
            self.graph.add_task(
                compile_id.clone(),
                Box::new(move || {
                    fs::create_dir_all(layout.classes())?;
                    executor
                        .run(backend.compile_command(&layout, &input_classes))
                        .with_context(|| {
                            format!("Compile stage for '{profile_name}' on {platform}")
                        })?;
                    Ok(())
                }),
            )?;
        }

        // Execute: run the artifact, capture stdout into the report file.
        {
            let executor = self.executor.clone();
            let backend = backend.clone();
            let layout = layout.clone();
            let profile = profile.clone();
            let platform = platform.clone();
            let report_file = report_file.clone();
            self.graph.add_task(
                execute_id.clone(),
                Box::new(move || {
                    let descriptor = layout.descriptor_file(&profile.name);
                    let run = BenchmarkRun::new(
                        profile.name.clone(),
                        profile.configuration.clone(),
                        BTreeMap::new(),
                    );
                    write_descriptor(&descriptor, &run).with_context(|| {
                        format!("Execute stage for '{}' on {platform}", profile.name)
                    })?;

                    info!("Running benchmarks for '{}'", profile.name);
                    executor
                        .run_to_report(
                            backend.execute_command(&layout, &descriptor),
                            &report_file,
                        )
                        .with_context(|| {
                            format!("Execute stage for '{}' on {platform}", profile.name)
                        })?;
                    Ok(())
                }),
            )?;
        }

        // Stage chain edges; Generate additionally hangs off the platform's
        // normal compilation when the host build names one.
        if let Some(upstream_id) = &upstream.task_id {
            if !self.graph.contains(upstream_id) {
                self.graph.add_marker(upstream_id.clone())?;
            }
            self.graph.add_dependency(generate_id.clone(), upstream_id)?;
        }
        self.graph.add_dependency(compile_id.clone(), generate_id.clone())?;
        self.graph.add_dependency(execute_id.clone(), compile_id.clone())?;

        Ok(RegisteredTasks {
            generate: generate_id,
            compile: compile_id,
            execute: execute_id,
            report_file,
        })
    }

    /// The declared task graph, for inspection and external dependencies.
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Root of the per-profile build subtrees.
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Run all registered pipelines with up to `jobs` concurrent tasks.
    pub fn run(&self, jobs: usize) -> Result<Vec<TaskOutcome>, GraphError> {
        self.graph.run(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ManagedRuntime, NativeToolchain};
    use benchpipe_core::BenchmarkConfiguration;

    fn native_backend() -> TargetBackend {
        TargetBackend::Native(NativeToolchain {
            generator: PathBuf::from("generator"),
            compiler: PathBuf::from("nativec"),
            arch: "linuxX64".to_string(),
        })
    }

    fn managed_backend() -> TargetBackend {
        TargetBackend::Managed(ManagedRuntime {
            generator: PathBuf::from("generator"),
            compiler: PathBuf::from("javac"),
            runtime: PathBuf::from("java"),
        })
    }

    fn upstream(task: Option<&str>) -> UpstreamCompilation {
        UpstreamCompilation {
            task_id: task.map(String::from),
            output_dir: PathBuf::from("out/classes"),
        }
    }

    fn profile(name: &str) -> BenchmarkProfile {
        BenchmarkProfile::new(name, BenchmarkConfiguration::new())
    }

    #[test]
    fn task_names_are_deterministic() {
        let mut orchestrator = PipelineOrchestrator::new("build/benchmarks", None);
        let tasks = orchestrator
            .register(&profile("main"), &native_backend(), &upstream(None))
            .unwrap();

        assert_eq!(tasks.generate, "nativeLinuxX64MainGenerate");
        assert_eq!(tasks.compile, "nativeLinuxX64MainBenchmark");
        assert_eq!(tasks.execute, "nativeLinuxX64MainBenchmarkExec");
        assert_eq!(
            tasks.report_file,
            PathBuf::from("build/benchmarks/main/nativeLinuxX64/reports/main.json")
        );
    }

    #[test]
    fn duplicate_pair_registration_fails() {
        let mut orchestrator = PipelineOrchestrator::new("build", None);
        orchestrator
            .register(&profile("main"), &native_backend(), &upstream(None))
            .unwrap();
        let err = orchestrator
            .register(&profile("main"), &native_backend(), &upstream(None))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateTask(_)));
    }

    #[test]
    fn same_profile_on_two_platforms_keeps_separate_layouts() {
        let mut orchestrator = PipelineOrchestrator::new("build", None);
        let native = orchestrator
            .register(&profile("main"), &native_backend(), &upstream(None))
            .unwrap();
        let managed = orchestrator
            .register(&profile("main"), &managed_backend(), &upstream(None))
            .unwrap();

        // Both pairs run concurrently; sharing a report path would let one
        // silently overwrite the other's results.
        assert_ne!(native.report_file, managed.report_file);
        assert_eq!(
            native.report_file,
            PathBuf::from("build/main/nativeLinuxX64/reports/main.json")
        );
        assert_eq!(
            managed.report_file,
            PathBuf::from("build/main/managed/reports/main.json")
        );
    }

    #[test]
    fn stage_edges_form_a_strict_chain() {
        let mut orchestrator = PipelineOrchestrator::new("build", None);
        let tasks = orchestrator
            .register(
                &profile("main"),
                &managed_backend(),
                &upstream(Some("compileMainClasses")),
            )
            .unwrap();

        let graph = orchestrator.graph();
        assert!(graph
            .dependencies(&tasks.execute)
            .unwrap()
            .contains(&tasks.compile));
        assert!(graph
            .dependencies(&tasks.compile)
            .unwrap()
            .contains(&tasks.generate));
        assert!(graph
            .dependencies(&tasks.generate)
            .unwrap()
            .contains("compileMainClasses"));

        let sorted = graph.topological_sort().unwrap();
        let pos = |id: &str| sorted.iter().position(|x| x == id).unwrap();
        assert!(pos("compileMainClasses") < pos(&tasks.generate));
        assert!(pos(&tasks.generate) < pos(&tasks.compile));
        assert!(pos(&tasks.compile) < pos(&tasks.execute));
    }

    #[test]
    fn upstream_marker_is_shared_between_pairs() {
        let mut orchestrator = PipelineOrchestrator::new("build", None);
        let shared = upstream(Some("compileMainClasses"));
        orchestrator
            .register(&profile("fast"), &managed_backend(), &shared)
            .unwrap();
        orchestrator
            .register(&profile("slow"), &managed_backend(), &shared)
            .unwrap();
        // The marker is registered once; a second registration must not
        // trip the duplicate check.
        assert!(orchestrator.graph().contains("compileMainClasses"));
    }
}

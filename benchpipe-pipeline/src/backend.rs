//! Target Backend Strategies
//!
//! One variant per target backend, selected by platform tag. Each variant
//! knows how to build the generate/compile/execute commands for its toolchain
//! and where the compiled artifact lands. The tools themselves (generator,
//! compilers, runtimes) are external collaborators invoked with a fixed
//! conventional argument shape.

use benchpipe_core::Platform;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Per-pipeline build-directory layout.
///
/// External generators and compilers read/write exactly these locations:
/// `sources/`, `resources/`, `classes/` and `reports/` under one subtree per
/// (profile, platform) pair. Namespacing by both profile name and platform
/// prefix is what lets independent pipelines run concurrently without
/// interfering — the same profile built for two platforms must never share a
/// report path.
#[derive(Debug, Clone)]
pub struct BuildLayout {
    root: PathBuf,
}

impl BuildLayout {
    /// Layout rooted at `<build_root>/<profile_name>/<platform_prefix>`.
    pub fn new(build_root: &Path, profile_name: &str, platform_prefix: &str) -> Self {
        Self {
            root: build_root.join(profile_name).join(platform_prefix),
        }
    }

    /// The per-profile root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generated driver sources.
    pub fn sources(&self) -> PathBuf {
        self.root.join("sources")
    }

    /// Generated resource files.
    pub fn resources(&self) -> PathBuf {
        self.root.join("resources")
    }

    /// Compile output (classes, bundled script, or native binary).
    pub fn classes(&self) -> PathBuf {
        self.root.join("classes")
    }

    /// Report output directory.
    pub fn reports(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Report file for this profile, e.g. `reports/main.json`.
    pub fn report_file(&self, profile_name: &str, extension: &str) -> PathBuf {
        self.reports().join(format!("{profile_name}.{extension}"))
    }

    /// Descriptor file handed to the artifact at execution time.
    pub fn descriptor_file(&self, profile_name: &str) -> PathBuf {
        self.root.join(format!("{profile_name}.descriptor"))
    }
}

/// Managed-runtime toolchain (compiled classes launched on a host VM).
#[derive(Debug, Clone)]
pub struct ManagedRuntime {
    /// Source generator executable.
    pub generator: PathBuf,
    /// The platform's normal compiler, reused with the extra source root.
    pub compiler: PathBuf,
    /// VM launcher used to execute the compiled classes.
    pub runtime: PathBuf,
}

/// Script-runtime toolchain (a bundled script run by an interpreter).
#[derive(Debug, Clone)]
pub struct ScriptRuntime {
    /// Source generator executable.
    pub generator: PathBuf,
    /// The platform's normal compiler/bundler, reused with the extra source root.
    pub compiler: PathBuf,
    /// Interpreter that executes the bundled script.
    pub interpreter: PathBuf,
}

/// Native toolchain (produces one optimized executable per profile).
#[derive(Debug, Clone)]
pub struct NativeToolchain {
    /// Source generator executable.
    pub generator: PathBuf,
    /// Native compiler driver.
    pub compiler: PathBuf,
    /// Toolchain architecture, e.g. `linuxX64`.
    pub arch: String,
}

/// Capability strategy for one target backend.
#[derive(Debug, Clone)]
pub enum TargetBackend {
    /// Managed-runtime target.
    Managed(ManagedRuntime),
    /// Script-runtime target.
    Script(ScriptRuntime),
    /// Natively compiled target.
    Native(NativeToolchain),
}

impl TargetBackend {
    /// The platform tag this backend implements.
    pub fn platform(&self) -> Platform {
        match self {
            TargetBackend::Managed(_) => Platform::Managed,
            TargetBackend::Script(_) => Platform::Script,
            TargetBackend::Native(toolchain) => Platform::Native {
                arch: toolchain.arch.clone(),
            },
        }
    }

    /// Command that produces driver sources and resources from the benchmark
    /// declarations found in the platform's compiled output.
    pub fn generate_command(&self, layout: &BuildLayout, input_classes: &Path) -> Command {
        let generator = match self {
            TargetBackend::Managed(runtime) => &runtime.generator,
            TargetBackend::Script(runtime) => &runtime.generator,
            TargetBackend::Native(toolchain) => &toolchain.generator,
        };
        let mut cmd = Command::new(generator);
        cmd.arg("--target")
            .arg(self.platform().task_prefix())
            .arg("--input-classes")
            .arg(input_classes)
            .arg("--sources")
            .arg(layout.sources())
            .arg("--resources")
            .arg(layout.resources());
        cmd
    }

    /// Command that compiles the benchmark variant.
    ///
    /// All backends add the generated source dir as an extra source root and
    /// keep the original compilation output on the search path; the native
    /// toolchain additionally produces a single optimized, non-debuggable
    /// executable.
    pub fn compile_command(&self, layout: &BuildLayout, input_classes: &Path) -> Command {
        match self {
            TargetBackend::Managed(runtime) => {
                let mut cmd = Command::new(&runtime.compiler);
                cmd.arg("--source-root")
                    .arg(layout.sources())
                    .arg("--classpath")
                    .arg(input_classes)
                    .arg("--out")
                    .arg(layout.classes());
                cmd
            }
            TargetBackend::Script(runtime) => {
                let mut cmd = Command::new(&runtime.compiler);
                cmd.arg("--source-root")
                    .arg(layout.sources())
                    .arg("--lib")
                    .arg(input_classes)
                    .arg("--out")
                    .arg(self.artifact_path(layout));
                cmd
            }
            TargetBackend::Native(toolchain) => {
                let mut cmd = Command::new(&toolchain.compiler);
                cmd.arg("--source-root")
                    .arg(layout.sources())
                    .arg("--library")
                    .arg(input_classes)
                    .arg("--target")
                    .arg(&toolchain.arch)
                    .arg("--optimize")
                    .arg("--no-debug")
                    .arg("--output")
                    .arg(self.artifact_path(layout));
                cmd
            }
        }
    }

    /// Command that runs the compiled artifact with the run descriptor path
    /// as its argument.
    pub fn execute_command(&self, layout: &BuildLayout, descriptor: &Path) -> Command {
        match self {
            TargetBackend::Managed(runtime) => {
                let mut cmd = Command::new(&runtime.runtime);
                cmd.arg("--classpath")
                    .arg(self.artifact_path(layout))
                    .arg(descriptor);
                cmd
            }
            TargetBackend::Script(runtime) => {
                let mut cmd = Command::new(&runtime.interpreter);
                cmd.arg(self.artifact_path(layout)).arg(descriptor);
                cmd
            }
            TargetBackend::Native(_) => {
                let mut cmd = Command::new(self.artifact_path(layout));
                cmd.arg(descriptor);
                cmd
            }
        }
    }

    /// Where the Compile stage leaves the runnable artifact.
    pub fn artifact_path(&self, layout: &BuildLayout) -> PathBuf {
        match self {
            TargetBackend::Managed(_) => layout.classes(),
            TargetBackend::Script(_) => layout.classes().join("benchmark.js"),
            TargetBackend::Native(_) => layout.classes().join("benchmark"),
        }
    }

    /// Report file extension for this target.
    pub fn report_extension(&self) -> &'static str {
        // All current backends emit JSON; surfaced per backend so a native
        // target can diverge without touching the orchestrator.
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native() -> TargetBackend {
        TargetBackend::Native(NativeToolchain {
            generator: PathBuf::from("/opt/bench/generator"),
            compiler: PathBuf::from("/opt/bench/nativec"),
            arch: "linuxX64".to_string(),
        })
    }

    #[test]
    fn layout_is_namespaced_by_profile_and_platform() {
        let layout = BuildLayout::new(Path::new("build/benchmarks"), "fast", "script");
        assert_eq!(layout.root(), Path::new("build/benchmarks/fast/script"));
        assert_eq!(
            layout.sources(),
            Path::new("build/benchmarks/fast/script/sources")
        );
        assert_eq!(
            layout.report_file("fast", "json"),
            Path::new("build/benchmarks/fast/script/reports/fast.json")
        );

        // The same profile on another platform lands in a disjoint subtree.
        let other = BuildLayout::new(Path::new("build/benchmarks"), "fast", "nativeLinuxX64");
        assert_ne!(layout.root(), other.root());
    }

    #[test]
    fn native_compile_is_optimized_and_non_debuggable() {
        let layout = BuildLayout::new(Path::new("build"), "main", "nativeLinuxX64");
        let cmd = native().compile_command(&layout, Path::new("build/classes/main"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"--optimize".to_string()));
        assert!(args.contains(&"--no-debug".to_string()));
    }

    #[test]
    fn native_executes_artifact_directly() {
        let layout = BuildLayout::new(Path::new("build"), "main", "nativeLinuxX64");
        let cmd = native().execute_command(&layout, Path::new("build/main/main.descriptor"));
        assert_eq!(
            cmd.get_program(),
            layout.classes().join("benchmark").as_os_str()
        );
    }

    #[test]
    fn platform_tags_match_variants() {
        assert_eq!(
            native().platform(),
            Platform::Native {
                arch: "linuxX64".to_string()
            }
        );
    }
}

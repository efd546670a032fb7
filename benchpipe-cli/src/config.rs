//! Configuration loading from benchpipe.toml
//!
//! Pipeline configuration lives in a `benchpipe.toml` file in the project
//! root, discovered by walking up from the current directory. It declares the
//! benchmark profiles to build and the target platforms to build them for;
//! every (profile, platform) pair becomes one Generate/Compile/Execute chain.

use benchpipe_core::{BenchmarkConfiguration, BenchmarkProfile};
use benchpipe_pipeline::{
    ManagedRuntime, NativeToolchain, ScriptRuntime, TargetBackend, UpstreamCompilation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Benchpipe configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Benchmark profiles (`[[profile]]` tables)
    #[serde(default, rename = "profile")]
    pub profiles: Vec<ProfileEntry>,
    /// Target platforms (`[[platform]]` tables)
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformEntry>,
}

/// Runner configuration for pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timeout for a single external process (e.g., "60s", "5m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Number of concurrently running tasks
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            jobs: None,
        }
    }
}

fn default_timeout() -> String {
    "60s".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for per-profile build subtrees
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
        }
    }
}

fn default_build_dir() -> String {
    "build/benchmarks".to_string()
}

/// One `[[profile]]` table: a named benchmark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Profile name; namespaces task ids and the build subtree.
    pub name: String,
    /// Iteration/mode settings forwarded to every run of this profile.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl ProfileEntry {
    /// Convert into the orchestrator's profile value.
    pub fn to_profile(&self) -> BenchmarkProfile {
        BenchmarkProfile::new(
            self.name.clone(),
            BenchmarkConfiguration::from_settings(self.settings.clone()),
        )
    }
}

/// One `[[platform]]` table: a target platform and its toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// Platform kind: "managed", "script", or "native"
    pub kind: String,
    /// Toolchain architecture (native only, e.g. "linuxX64")
    #[serde(default)]
    pub arch: Option<String>,
    /// Source generator executable
    pub generator: String,
    /// Compiler driver for the benchmark variant
    pub compiler: String,
    /// VM launcher (managed only)
    #[serde(default)]
    pub runtime: Option<String>,
    /// Script interpreter (script only)
    #[serde(default)]
    pub interpreter: Option<String>,
    /// Compiled output of the platform's normal compilation
    pub classes_dir: String,
    /// Task id of that compilation, if the host build exposes one
    #[serde(default)]
    pub compilation_task: Option<String>,
}

impl PlatformEntry {
    /// Build the backend strategy, validating kind-specific fields.
    pub fn backend(&self) -> anyhow::Result<TargetBackend> {
        match self.kind.as_str() {
            "managed" => {
                let runtime = self.runtime.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("managed platform requires a 'runtime' launcher")
                })?;
                Ok(TargetBackend::Managed(ManagedRuntime {
                    generator: PathBuf::from(&self.generator),
                    compiler: PathBuf::from(&self.compiler),
                    runtime: PathBuf::from(runtime),
                }))
            }
            "script" => {
                let interpreter = self.interpreter.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("script platform requires an 'interpreter'")
                })?;
                Ok(TargetBackend::Script(ScriptRuntime {
                    generator: PathBuf::from(&self.generator),
                    compiler: PathBuf::from(&self.compiler),
                    interpreter: PathBuf::from(interpreter),
                }))
            }
            "native" => {
                let arch = self.arch.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("native platform requires an 'arch' (e.g. \"linuxX64\")")
                })?;
                Ok(TargetBackend::Native(NativeToolchain {
                    generator: PathBuf::from(&self.generator),
                    compiler: PathBuf::from(&self.compiler),
                    arch: arch.clone(),
                }))
            }
            other => Err(anyhow::anyhow!(
                "unknown platform kind '{}': expected \"managed\", \"script\", or \"native\"",
                other
            )),
        }
    }

    /// The platform's normal compilation this pipeline builds on.
    pub fn upstream(&self) -> UpstreamCompilation {
        UpstreamCompilation {
            task_id: self.compilation_task.clone(),
            output_dir: PathBuf::from(&self.classes_dir),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("benchpipe.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Benchpipe Configuration

[runner]
# Timeout for a single external process (generate, compile, or execute)
timeout = "60s"
# Number of concurrently running tasks (uncomment to enable)
# jobs = 4

[output]
# Root directory for per-profile build subtrees
build_dir = "build/benchmarks"

[[profile]]
name = "main"
# Iteration/mode settings forwarded to the measurement engine
[profile.settings]
# iterations = "5"
# mode = "throughput"

[[platform]]
kind = "native"
arch = "linuxX64"
generator = "tools/generator"
compiler = "tools/nativec"
classes_dir = "build/classes/main"
# Task id of the platform's normal compilation (uncomment to enable)
# compilation_task = "compileMainClasses"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}

//! Benchmark Data Model
//!
//! Types shared between the orchestrator, the descriptor protocol, and the
//! report layer. All of them are plain values: constructed once at pipeline
//! setup (or by a protocol parse) and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Iteration/mode settings for a benchmark run.
///
/// The settings map is treated as opaque everywhere except the descriptor
/// protocol, which encodes the whole configuration as a single
/// `{key=value, key=value}` token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfiguration {
    settings: BTreeMap<String, String>,
}

impl BenchmarkConfiguration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from an already-parsed settings map.
    pub fn from_settings(settings: BTreeMap<String, String>) -> Self {
        Self { settings }
    }

    /// Look up a single setting.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// The full settings map, in key order.
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Whether no settings were supplied.
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

/// A single benchmark run as described by one descriptor file.
///
/// Constructed exclusively by the descriptor protocol and consumed by the
/// measurement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkRun {
    /// Benchmark name, unique within a run.
    pub name: String,
    /// Iteration/mode settings.
    pub configuration: BenchmarkConfiguration,
    /// Free-form benchmark parameters (keys unique, order irrelevant).
    pub parameters: BTreeMap<String, String>,
}

impl BenchmarkRun {
    /// Create a run descriptor value.
    pub fn new(
        name: impl Into<String>,
        configuration: BenchmarkConfiguration,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            configuration,
            parameters,
        }
    }
}

/// A named benchmark configuration registered with the orchestrator.
///
/// The profile name namespaces task identifiers and the per-configuration
/// build directory, so it must be unique within one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkProfile {
    /// Profile name, e.g. `main` or `fast`.
    pub name: String,
    /// Settings applied to every run of this profile.
    pub configuration: BenchmarkConfiguration,
}

impl BenchmarkProfile {
    /// Create a profile.
    pub fn new(name: impl Into<String>, configuration: BenchmarkConfiguration) -> Self {
        Self {
            name: name.into(),
            configuration,
        }
    }
}

/// Target backend a pipeline is instantiated for.
///
/// Created once at pipeline setup; drives which generate/compile/execute
/// strategy the orchestrator selects and how task identifiers are prefixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Platform {
    /// Managed-runtime target (JVM-style: compiled classes run on a host VM).
    Managed,
    /// Script-runtime target (node-style: a bundled script run by an interpreter).
    Script,
    /// Natively compiled target, parameterized by architecture (e.g. `linuxX64`).
    Native {
        /// Toolchain architecture name.
        arch: String,
    },
}

impl Platform {
    /// Prefix used when composing task identifiers, e.g. `nativeLinuxX64`.
    pub fn task_prefix(&self) -> String {
        match self {
            Platform::Managed => "managed".to_string(),
            Platform::Script => "script".to_string(),
            Platform::Native { arch } => format!("native{}", upper_first(arch)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Managed => write!(f, "managed"),
            Platform::Script => write!(f, "script"),
            Platform::Native { arch } => write!(f, "native ({arch})"),
        }
    }
}

/// One ordered unit of the per-platform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Produce driver sources and resources from benchmark declarations.
    Generate,
    /// Compile the benchmark variant into an executable/script artifact.
    Compile,
    /// Run the artifact and collect its report.
    Execute,
}

impl StageKind {
    /// Deterministic task-name suffix consumed by external tools.
    pub fn task_suffix(&self) -> &'static str {
        match self {
            StageKind::Generate => "Generate",
            StageKind::Compile => "Benchmark",
            StageKind::Execute => "BenchmarkExec",
        }
    }
}

/// Upper-case the first character, leaving the rest untouched.
///
/// Used when splicing profile names into camel-cased task identifiers.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Report Data Structures

use benchpipe_core::format_decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One benchmark result as it appears in the report file.
///
/// Produced by the measurement engine in execution order; consumers must not
/// reorder entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBenchmarkResult {
    /// Fully-qualified benchmark identifier.
    pub benchmark: String,
    /// Primary score (e.g. operations per second).
    pub score: f64,
    /// Half-width of the score confidence interval, when available.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_margin: Option<f64>,
    /// Benchmark parameters this result was measured with.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ReportBenchmarkResult {
    /// Create a result without an error margin.
    pub fn new(benchmark: impl Into<String>, score: f64) -> Self {
        Self {
            benchmark: benchmark.into(),
            score,
            error_margin: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Attach the parameters the benchmark ran with.
    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Human-readable score with thousands grouping, e.g. `1,234,567.891`.
    pub fn display_score(&self) -> String {
        format_decimal(self.score, 3, true)
    }
}

//! Benchmark-Run Descriptor Encoding
//!
//! A descriptor is UTF-8 text with exactly three non-empty lines:
//!
//! ```text
//! benchmark: <name>
//! configuration: {<key=value, ...>}
//! parameters: <key=value, ...>
//! ```
//!
//! Keys and values must not contain line breaks or the `", "` entry separator;
//! within that domain `parse(serialize(run)) == run` holds for every run.

use benchpipe_core::{read_all, write_all, BenchmarkConfiguration, BenchmarkRun, FileError};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

const BENCHMARK_FIELD: &str = "benchmark";
const CONFIGURATION_FIELD: &str = "configuration";
const PARAMETERS_FIELD: &str = "parameters";

const ENTRY_SEPARATOR: &str = ", ";

/// Descriptor encode/decode failures. All of them abort the run.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The descriptor did not contain exactly three non-empty lines.
    #[error("wrong descriptor format: expected 3 non-empty lines, found {found}")]
    LineCount {
        /// Number of non-empty lines encountered.
        found: usize,
    },

    /// A line did not start with the keyword expected at its position.
    #[error("missing required field '{field}'")]
    MissingField {
        /// The expected keyword.
        field: &'static str,
    },

    /// The configuration token was not wrapped in `{` `}`.
    #[error("malformed configuration token '{token}'")]
    MalformedConfiguration {
        /// The offending token.
        token: String,
    },

    /// A map entry was not of the `key=value` shape.
    #[error("malformed map entry '{entry}'")]
    MalformedEntry {
        /// The offending entry.
        entry: String,
    },

    /// Reading or writing the descriptor file failed.
    #[error(transparent)]
    File(#[from] FileError),
}

/// Serialize a run to descriptor text: three keyword-prefixed lines, each
/// newline-terminated, in the fixed `benchmark`/`configuration`/`parameters`
/// order.
pub fn serialize(run: &BenchmarkRun) -> String {
    format!(
        "{BENCHMARK_FIELD}: {}\n{CONFIGURATION_FIELD}: {}\n{PARAMETERS_FIELD}: {}\n",
        run.name,
        encode_configuration(&run.configuration),
        encode_map(&run.parameters),
    )
}

/// Parse descriptor text into a run.
///
/// Empty lines are discarded; exactly three lines must remain, and line `i`
/// must start with the keyword expected at position `i`. Anything else fails —
/// there is no recoverable default.
pub fn parse(text: &str) -> Result<BenchmarkRun, DescriptorError> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    if lines.len() != 3 {
        return Err(DescriptorError::LineCount { found: lines.len() });
    }

    let name = field_value(lines[0], BENCHMARK_FIELD)?;
    let configuration = decode_configuration(field_value(lines[1], CONFIGURATION_FIELD)?)?;
    let parameters = decode_map(field_value(lines[2], PARAMETERS_FIELD)?)?;

    Ok(BenchmarkRun::new(name, configuration, parameters))
}

/// Write a run descriptor to `path`.
pub fn write_descriptor(path: impl AsRef<Path>, run: &BenchmarkRun) -> Result<(), DescriptorError> {
    write_all(path, &serialize(run))?;
    Ok(())
}

/// Read and parse the run descriptor at `path`.
pub fn read_descriptor(path: impl AsRef<Path>) -> Result<BenchmarkRun, DescriptorError> {
    parse(&read_all(path)?)
}

fn field_value<'a>(line: &'a str, field: &'static str) -> Result<&'a str, DescriptorError> {
    line.strip_prefix(field)
        .and_then(|rest| rest.strip_prefix(": "))
        .ok_or(DescriptorError::MissingField { field })
}

fn encode_configuration(configuration: &BenchmarkConfiguration) -> String {
    format!("{{{}}}", encode_map(configuration.settings()))
}

fn decode_configuration(token: &str) -> Result<BenchmarkConfiguration, DescriptorError> {
    let inner = token
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| DescriptorError::MalformedConfiguration {
            token: token.to_string(),
        })?;
    Ok(BenchmarkConfiguration::from_settings(decode_map(inner)?))
}

fn encode_map(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

fn decode_map(text: &str) -> Result<BTreeMap<String, String>, DescriptorError> {
    let mut map = BTreeMap::new();
    if text.is_empty() {
        return Ok(map);
    }
    for entry in text.split(ENTRY_SEPARATOR) {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| DescriptorError::MalformedEntry {
                entry: entry.to_string(),
            })?;
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

//! Process Execution and Report Capture
//!
//! Runs a compiled benchmark artifact as a subprocess, captures its full
//! standard output, and publishes the report file. Two behaviors the
//! reference pipeline lacked are implemented here deliberately:
//!
//! - a configurable timeout (SIGTERM, short grace period, then SIGKILL) so a
//!   hung artifact fails its stage instead of wedging the whole run;
//! - reports are written to a temporary path and renamed into place, so a
//!   crash or cancellation can never publish a partial report.
//!
//! When the artifact brackets its payload between the sentinel lines
//! [`BEGIN_REPORT_MARKER`] / [`END_REPORT_MARKER`], everything outside the
//! markers is treated as progress logging and re-emitted through `tracing`;
//! without markers the whole captured output is the payload.

use std::fs;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Sentinel line opening the machine-parseable report section.
pub const BEGIN_REPORT_MARKER: &str = "####BEGIN_REPORT####";
/// Sentinel line closing the machine-parseable report section.
pub const END_REPORT_MARKER: &str = "####END_REPORT####";

/// Poll interval while waiting for a child process.
const WAIT_POLL: Duration = Duration::from_millis(25);
/// Grace period between SIGTERM and SIGKILL on timeout.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Artifact execution failures. All of them fail the Execute stage; none of
/// them publish a report.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The artifact could not be spawned.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact exited with a non-zero status.
    #[error("'{program}' exited with status {code}")]
    NonZeroExit {
        /// Program that failed.
        program: String,
        /// Exit code (`-1` when terminated by signal).
        code: i32,
    },

    /// The artifact exceeded the configured timeout and was terminated.
    #[error("'{program}' timed out after {timeout:?}")]
    Timeout {
        /// Program that was terminated.
        program: String,
        /// Configured timeout.
        timeout: Duration,
    },

    /// Reading the artifact's output failed.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        /// Program being run.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or renaming the report file failed.
    #[error("failed to publish report '{path}': {source}")]
    Report {
        /// Report path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Runs compiled benchmark artifacts and persists their reports.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    /// Executor with an optional per-process timeout.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run `cmd` to completion and return its captured standard output.
    ///
    /// Blocks until the process terminates; non-zero exit is an error.
    pub fn run(&self, mut cmd: Command) -> Result<String, ExecError> {
        let program = cmd.get_program().to_string_lossy().into_owned();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        // New session: the child leads its own process group, so a timeout
        // can signal every descendant, not just the direct child.
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        debug!(program = %program, "spawning process");
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Drain stdout on a separate thread so a chatty artifact can never
        // fill the pipe and deadlock against our wait loop.
        let mut stdout = child.stdout.take().ok_or_else(|| ExecError::Io {
            program: program.clone(),
            source: std::io::Error::other("stdout was not captured"),
        })?;
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });

        let status = match self.timeout {
            None => child.wait().map_err(|source| ExecError::Io {
                program: program.clone(),
                source,
            })?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    match child.try_wait().map_err(|source| ExecError::Io {
                        program: program.clone(),
                        source,
                    })? {
                        Some(status) => break status,
                        None if Instant::now() >= deadline => {
                            terminate(&mut child);
                            // The reader thread is left detached: it exits
                            // once the last write end of the pipe closes, and
                            // its output is discarded either way. Joining it
                            // here could block on a straggler still holding
                            // the pipe.
                            drop(reader);
                            return Err(ExecError::Timeout { program, timeout });
                        }
                        None => std::thread::sleep(WAIT_POLL),
                    }
                }
            }
        };

        let output = reader
            .join()
            .unwrap_or_else(|_| Ok(String::new()))
            .map_err(|source| ExecError::Io {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ExecError::NonZeroExit {
                program,
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(output)
    }

    /// Run `cmd` and persist its report payload to `report_path`.
    ///
    /// The reports directory is created if needed (idempotent); the payload is
    /// written to a temporary file next to the final path and renamed into
    /// place on success. Any failure propagates without touching an existing
    /// report file.
    pub fn run_to_report(&self, cmd: Command, report_path: &Path) -> Result<(), ExecError> {
        let output = self.run(cmd)?;
        let (progress, payload) = split_report(&output);
        for line in progress {
            info!(benchmark_output = line);
        }
        publish_report(report_path, &payload)
    }
}

/// Split captured output into (progress lines, report payload).
fn split_report(output: &str) -> (Vec<&str>, String) {
    let lines: Vec<&str> = output.lines().collect();
    let begin = lines.iter().position(|l| l.trim() == BEGIN_REPORT_MARKER);
    let end = lines.iter().rposition(|l| l.trim() == END_REPORT_MARKER);

    match (begin, end) {
        (Some(b), Some(e)) if b < e => {
            let mut payload = lines[b + 1..e].join("\n");
            if !payload.is_empty() {
                payload.push('\n');
            }
            let progress = lines[..b].iter().chain(&lines[e + 1..]).copied().collect();
            (progress, payload)
        }
        _ => (Vec::new(), output.to_string()),
    }
}

/// Atomically publish `payload` at `path` via a temporary file + rename.
fn publish_report(path: &Path, payload: &str) -> Result<(), ExecError> {
    let report_err = |source: std::io::Error| ExecError::Report {
        path: path.display().to_string(),
        source,
    };

    let dir = path.parent().ok_or_else(|| {
        report_err(std::io::Error::other("report path has no parent directory"))
    })?;
    fs::create_dir_all(dir).map_err(report_err)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| report_err(std::io::Error::other("report path has no file name")))?;
    let tmp = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp, payload).map_err(report_err)?;
    fs::rename(&tmp, path).map_err(report_err)
}

/// SIGTERM the child's process group, wait out the grace period, then SIGKILL.
///
/// The child was started with `setsid`, so its pid doubles as the pgid and the
/// negative-pid form reaches every descendant still in the group.
fn terminate(child: &mut std::process::Child) {
    let pgid = child.id() as libc::pid_t;
    unsafe {
        libc::kill(-pgid, libc::SIGTERM);
    }
    let deadline = Instant::now() + KILL_GRACE;
    while Instant::now() < deadline {
        if matches!(child.try_wait(), Ok(Some(_))) {
            return;
        }
        std::thread::sleep(WAIT_POLL);
    }
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
    let _ = child.wait();
}

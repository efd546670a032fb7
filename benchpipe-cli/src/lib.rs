#![warn(missing_docs)]
//! Benchpipe CLI Library
//!
//! Command-line front end for the benchmark pipeline: loads `benchpipe.toml`,
//! instantiates one Generate/Compile/Execute chain per (profile, platform)
//! pair, and runs the resulting task graph.
//!
//! # Example
//!
//! ```ignore
//! benchpipe list
//! benchpipe run 'fast.*' --jobs 4
//! ```

mod config;

pub use config::*;

use benchpipe_pipeline::{PipelineOrchestrator, RegisteredTasks, TaskStatus};
use clap::{Parser, Subcommand};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// Benchpipe CLI arguments
#[derive(Parser, Debug)]
#[command(name = "benchpipe")]
#[command(author, version, about = "Benchpipe - multi-target benchmark build pipeline")]
pub struct Cli {
    /// Optional subcommand (List, Run, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter profiles by regex pattern (when no subcommand is given)
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Path to benchpipe.toml (discovered by walking up if not specified)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for build output (overrides benchpipe.toml)
    #[arg(long, global = true)]
    pub build_dir: Option<PathBuf>,

    /// Timeout for a single external process, e.g. "60s" (overrides benchpipe.toml)
    #[arg(long, global = true)]
    pub timeout: Option<String>,

    /// Number of concurrently running tasks
    #[arg(long, global = true, default_value = "1")]
    pub jobs: usize,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tasks that would run, without executing anything
    List {
        /// Filter profiles by regex pattern
        #[arg(default_value = ".*")]
        filter: String,
    },
    /// Run the benchmark pipelines (default)
    Run {
        /// Filter profiles by regex pattern
        #[arg(default_value = ".*")]
        filter: String,
    },
    /// Print a commented default benchpipe.toml to stdout
    Init,
}

/// Run the Benchpipe CLI with the given arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Benchpipe CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("benchpipe=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("benchpipe=info")
            .init();
    }

    if matches!(cli.command, Some(Commands::Init)) {
        print!("{}", PipelineConfig::default_toml());
        return Ok(());
    }

    // Discover benchpipe.toml (an explicit --config path wins)
    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::discover().unwrap_or_default(),
    };

    match &cli.command {
        Some(Commands::List { filter }) => list_pipelines(&cli, filter, &config),
        Some(Commands::Run { filter }) => run_pipelines(&cli, filter, &config),
        None => run_pipelines(&cli, &cli.filter, &config),
        Some(Commands::Init) => unreachable!("handled above"),
    }
}

/// Profiles matching the CLI filter, in configuration order.
fn filter_profiles<'a>(filter: &str, config: &'a PipelineConfig) -> Vec<&'a ProfileEntry> {
    let filter_re = Regex::new(filter).ok();
    config
        .profiles
        .iter()
        .filter(|p| {
            filter_re
                .as_ref()
                .map(|re| re.is_match(&p.name))
                .unwrap_or(true)
        })
        .collect()
}

/// Build the orchestrator and register every (profile, platform) pair.
fn register_pipelines(
    cli: &Cli,
    filter: &str,
    config: &PipelineConfig,
) -> anyhow::Result<(PipelineOrchestrator, Vec<RegisteredTasks>)> {
    let build_root = cli
        .build_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.build_dir));

    let timeout_str = cli.timeout.as_deref().unwrap_or(&config.runner.timeout);
    let timeout_ns = PipelineConfig::parse_duration(timeout_str)?;
    let timeout = (timeout_ns > 0).then(|| Duration::from_nanos(timeout_ns));

    let mut orchestrator = PipelineOrchestrator::new(build_root, timeout);
    let mut registered = Vec::new();

    for platform in &config.platforms {
        let backend = platform.backend()?;
        let upstream = platform.upstream();
        for profile in filter_profiles(filter, config) {
            let tasks = orchestrator.register(&profile.to_profile(), &backend, &upstream)?;
            registered.push(tasks);
        }
    }

    Ok((orchestrator, registered))
}

fn list_pipelines(cli: &Cli, filter: &str, config: &PipelineConfig) -> anyhow::Result<()> {
    let (_, registered) = register_pipelines(cli, filter, config)?;

    println!("Benchpipe Plan:");
    for tasks in &registered {
        println!("├── {}", tasks.execute);
        println!("│   ├── {}", tasks.generate);
        println!("│   ├── {}", tasks.compile);
        println!("│   └── report: {}", tasks.report_file.display());
    }
    println!("{} pipeline(s) found.", registered.len());

    Ok(())
}

fn run_pipelines(cli: &Cli, filter: &str, config: &PipelineConfig) -> anyhow::Result<()> {
    let (orchestrator, registered) = register_pipelines(cli, filter, config)?;

    if registered.is_empty() {
        println!("No pipelines found.");
        return Ok(());
    }

    // Resolve jobs: CLI wins if explicitly set (not default 1), else benchpipe.toml, else 1
    let jobs = if cli.jobs != 1 {
        cli.jobs
    } else {
        config.runner.jobs.unwrap_or(1)
    };

    println!(
        "Running {} pipeline(s), {} concurrent task(s)...\n",
        registered.len(),
        jobs
    );

    let outcomes = orchestrator.run(jobs)?;

    let mut failed = 0;
    let mut skipped = 0;
    for outcome in &outcomes {
        match &outcome.status {
            TaskStatus::Completed => println!("✓ {}", outcome.id),
            TaskStatus::Failed { message } => {
                failed += 1;
                println!("✗ {}: {}", outcome.id, message);
            }
            TaskStatus::Skipped { blocked_on } => {
                skipped += 1;
                println!("⊘ {} (blocked on {})", outcome.id, blocked_on);
            }
        }
    }

    println!();
    for tasks in &registered {
        let executed = outcomes
            .iter()
            .any(|o| o.id == tasks.execute && o.is_completed());
        if executed {
            println!("Report written to: {}", tasks.report_file.display());
        }
    }

    if failed > 0 || skipped > 0 {
        eprintln!("\n{} task(s) failed, {} skipped", failed, skipped);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_defaults() -> Cli {
        Cli {
            command: None,
            filter: ".*".to_string(),
            config: None,
            build_dir: Some(PathBuf::from("build/benchmarks")),
            timeout: None,
            jobs: 1,
            verbose: false,
        }
    }

    fn two_profile_config() -> PipelineConfig {
        toml::from_str(
            r#"
            [[profile]]
            name = "fast"

            [[profile]]
            name = "full"

            [[platform]]
            kind = "native"
            arch = "linuxX64"
            generator = "gen"
            compiler = "cc"
            classes_dir = "out"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn filter_selects_matching_profiles() {
        let config = two_profile_config();
        let names: Vec<&str> = filter_profiles("fa.*", &config)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["fast"]);

        assert_eq!(filter_profiles(".*", &config).len(), 2);
        assert!(filter_profiles("nothing", &config).is_empty());
    }

    #[test]
    fn registration_covers_every_pair() {
        let config = two_profile_config();
        let (orchestrator, registered) =
            register_pipelines(&cli_defaults(), ".*", &config).unwrap();

        assert_eq!(registered.len(), 2);
        assert_eq!(registered[0].execute, "nativeLinuxX64FastBenchmarkExec");
        assert_eq!(registered[1].execute, "nativeLinuxX64FullBenchmarkExec");
        // 3 stages per pair
        assert_eq!(orchestrator.graph().task_ids().count(), 6);
    }

    #[test]
    fn zero_timeout_disables_the_deadline() {
        let mut cli = cli_defaults();
        cli.timeout = Some("0s".to_string());
        let config = two_profile_config();
        // Registration must accept a zero timeout without error.
        register_pipelines(&cli, ".*", &config).unwrap();
    }

    #[test]
    fn options_parse_after_the_subcommand() {
        let cli = Cli::try_parse_from(["benchpipe", "run", "fast.*", "--jobs", "4"]).unwrap();
        match cli.command {
            Some(Commands::Run { ref filter }) => assert_eq!(filter, "fast.*"),
            ref other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.jobs, 4);

        let cli = Cli::try_parse_from(["benchpipe", "list", "--verbose"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::List { .. })));
        assert!(cli.verbose);
    }

    #[test]
    fn bare_filter_still_parses() {
        let cli = Cli::try_parse_from(["benchpipe", "fast.*"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.filter, "fast.*");
    }
}

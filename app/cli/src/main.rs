use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use logbench::report::{format_bytes, format_measurement};
use logbench::{
    aggregate, compression_ratio, render, standard_roster, BackendDescriptor, BackendKind, BaselineTable, BenchConfig,
    BenchRunner, ConfigFile, InputFile, Measurement, OutputFormat, Report, RunObserver,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Comparative benchmark harness for log compression backends
#[derive(Parser)]
#[command(name = "logbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file path (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that resolves the roster
#[derive(clap::Args)]
struct RosterArgs {
    /// Recorded baseline sizes (JSON: {"<backend>": {"<file>": <size>}})
    #[arg(long, value_name = "FILE")]
    baselines: Option<PathBuf>,

    /// Directory that external executable paths are resolved against
    #[arg(long, value_name = "DIR")]
    tools_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark every backend against the given log files
    Run {
        /// Log files to compress
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        #[command(flatten)]
        roster: RosterArgs,

        /// Time limit for each external invocation, in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<f64>,

        /// Concurrent measurements per file (0 = one per CPU core)
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,

        /// Decompress every output and compare it with the input
        #[arg(long)]
        verify: bool,

        /// Format of the report printed to stdout
        #[arg(short, long, value_name = "FORMAT", default_value = "console")]
        format: OutputFormat,

        /// Write a Markdown report
        #[arg(long, value_name = "PATH")]
        markdown: Option<PathBuf>,

        /// Write an HTML report
        #[arg(long, value_name = "PATH")]
        html: Option<PathBuf>,

        /// Write a JSON report
        #[arg(long, value_name = "PATH")]
        json: Option<PathBuf>,

        /// Write a CSV report
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },

    /// List the backend roster and whether each backend can run here
    Backends {
        #[command(flatten)]
        roster: RosterArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity flags
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration if specified
    let (config, roster) = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            files,
            roster: roster_args,
            timeout,
            jobs,
            verify,
            format,
            markdown,
            html,
            json,
            csv,
        } => {
            let mut config = apply_roster_args(config, &roster_args)?;
            if let Some(secs) = timeout {
                config = config.with_timeout(parse_timeout(secs)?);
            }
            if let Some(jobs) = jobs {
                config = config.with_parallelism(jobs);
            }
            if verify {
                config = config.with_verify_round_trip(true);
            }

            let outputs = ReportOutputs {
                stdout: format,
                files: [
                    (OutputFormat::Markdown, markdown),
                    (OutputFormat::Html, html),
                    (OutputFormat::Json, json),
                    (OutputFormat::Csv, csv),
                ]
                .into_iter()
                .filter_map(|(format, path)| path.map(|p| (format, p)))
                .collect(),
            };

            run_command(&files, config, roster, &outputs, cli.quiet)?;
        }
        Commands::Backends { roster: roster_args } => {
            let config = apply_roster_args(config, &roster_args)?;
            backends_command(config, roster)?;
        }
    }

    Ok(())
}

/// Set up logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let log_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logging initialized at {} level", log_level);
}

/// Load configuration and an optional replacement roster from a file
fn load_config(path: Option<&Path>) -> Result<(BenchConfig, Option<Vec<BackendDescriptor>>)> {
    let Some(path) = path else {
        return Ok((BenchConfig::default(), None));
    };

    let file = ConfigFile::from_path(path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    let (config, roster) = file
        .apply(BenchConfig::default())
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    debug!("Loaded configuration from {}", path.display());
    Ok((config, roster))
}

/// Apply the roster-related command-line overrides
fn apply_roster_args(mut config: BenchConfig, args: &RosterArgs) -> Result<BenchConfig> {
    if let Some(path) = &args.baselines {
        let table = BaselineTable::from_json_file(path)
            .with_context(|| format!("Failed to load baseline table: {}", path.display()))?;
        debug!("Loaded recorded baselines from {}", path.display());
        config.recorded.merge(table);
    }
    if let Some(dir) = &args.tools_dir {
        config = config.with_tools_dir(dir);
    }
    Ok(config)
}

fn parse_timeout(secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => bail!("--timeout must be a positive number of seconds, got {}", secs),
    }
}

/// Where the aggregated report goes
struct ReportOutputs {
    stdout: OutputFormat,
    files: Vec<(OutputFormat, PathBuf)>,
}

/// Prints each measurement above the spinner as it arrives.
///
/// Skipped inputs and backends are already reported through the log.
struct ConsoleObserver {
    progress: ProgressBar,
}

impl RunObserver for ConsoleObserver {
    fn on_file_start(&self, file: &InputFile) {
        self.progress.set_message(format!("Benchmarking {}", file.name));
        self.progress.println(format!(
            "{} ({})",
            file.name,
            format_bytes(file.original_size)
        ));
    }

    fn on_measurement(&self, file: &InputFile, measurement: &Measurement) {
        let ratio = compression_ratio(file.original_size, measurement.compressed_size);
        self.progress
            .println(format!("  {}", format_measurement(measurement, ratio)));
    }
}

/// Execute the run command
fn run_command(
    files: &[PathBuf],
    config: BenchConfig,
    roster: Option<Vec<BackendDescriptor>>,
    outputs: &ReportOutputs,
    quiet: bool,
) -> Result<()> {
    let runner = BenchRunner::with_roster(config, roster.unwrap_or_else(standard_roster))
        .context("Invalid backend roster")?;

    info!(
        "Benchmarking {} file(s) against {} backend(s)",
        files.len(),
        runner.roster().len()
    );

    let observer = ConsoleObserver {
        progress: create_progress_bar(quiet, "Benchmarking"),
    };
    let outcome = runner.run_with(files, &observer);
    observer.progress.finish_and_clear();

    if outcome.results.is_empty() {
        bail!("None of the {} input file(s) could be read", files.len());
    }

    let report = aggregate(&outcome.results, &runner.config().baselines);

    for (format, path) in &outputs.files {
        write_report(*format, &report, path)?;
    }

    let rendered = render(outputs.stdout, &report).context("Failed to render report")?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;

    // Display summary
    if !quiet {
        eprintln!("✓ Benchmark complete");
        eprintln!("  Files:        {}", outcome.results.len());
        eprintln!("  Measurements: {}", outcome.measurement_count());
        eprintln!("  Failures:     {}", report.summary.failures);
        if !outcome.skipped_backends.is_empty() {
            let names: Vec<_> = outcome.skipped_backends.iter().map(|s| s.name.as_str()).collect();
            eprintln!("  Skipped:      {}", names.join(", "));
        }
        eprintln!("  Time:         {:.3}s", outcome.elapsed.as_secs_f64());
    }

    Ok(())
}

/// Render one report file
fn write_report(format: OutputFormat, report: &Report, path: &Path) -> Result<()> {
    let text = render(format, report).with_context(|| format!("Failed to render {} report", format))?;
    fs::write(path, text).with_context(|| format!("Failed to write report file: {}", path.display()))?;
    info!("{} report saved to {}", format, path.display());
    Ok(())
}

/// Execute the backends command
fn backends_command(config: BenchConfig, roster: Option<Vec<BackendDescriptor>>) -> Result<()> {
    let runner = BenchRunner::with_roster(config, roster.unwrap_or_else(standard_roster))
        .context("Invalid backend roster")?;

    let status = runner.backend_status();
    let width = status
        .iter()
        .map(|s| s.descriptor.name.len())
        .max()
        .unwrap_or(0)
        .max("Backend".len());

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{:<w$}  {:<9}  {:<40}  Status", "Backend", "Kind", "Detail", w = width)?;
    for entry in &status {
        let detail = describe(&entry.descriptor, runner.config());
        let state = match &entry.unavailable {
            None if entry.resolved_as == "recorded"
                && matches!(entry.descriptor.kind, BackendKind::External { .. }) =>
            {
                "recorded fallback".to_string()
            }
            None => "available".to_string(),
            Some(reason) => format!("unavailable ({})", reason),
        };
        writeln!(
            stdout,
            "{:<w$}  {:<9}  {:<40}  {}",
            entry.descriptor.name,
            entry.resolved_as,
            detail,
            state,
            w = width
        )?;
    }
    stdout.flush()?;
    Ok(())
}

/// Short description of how a backend is invoked
fn describe(descriptor: &BackendDescriptor, config: &BenchConfig) -> String {
    match &descriptor.kind {
        BackendKind::Codec {
            codec,
            level,
            extreme,
        } => format!("{} -{}{}", codec, level, if *extreme { "e" } else { "" }),
        BackendKind::External { executable, .. } => {
            config.resolve_executable(executable).display().to_string()
        }
        BackendKind::Recorded => "recorded sizes".to_string(),
    }
}

/// Create a progress bar (spinner) for operations
fn create_progress_bar(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        // Return a hidden progress bar in quiet mode
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(1.5).unwrap(), Duration::from_millis(1500));
        assert!(parse_timeout(0.0).is_err());
        assert!(parse_timeout(-1.0).is_err());
        assert!(parse_timeout(f64::NAN).is_err());
    }

    #[test]
    fn test_describe_codec() {
        let config = BenchConfig::default();
        let lzma = &standard_roster()[2];
        assert_eq!(describe(lzma, &config), "xz -9e");
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "logbench", "run", "a.log", "b.log", "--jobs", "4", "--timeout", "30", "--markdown", "out.md",
            "--format", "md",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                files,
                jobs,
                timeout,
                markdown,
                format,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(jobs, Some(4));
                assert_eq!(timeout, Some(30.0));
                assert_eq!(markdown, Some(PathBuf::from("out.md")));
                assert_eq!(format, OutputFormat::Markdown);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_requires_files() {
        assert!(Cli::try_parse_from(["logbench", "run"]).is_err());
    }
}

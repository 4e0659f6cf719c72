//! # logbench
//!
//! Comparative benchmarking harness for log-compression backends.
//!
//! A run applies every registered backend to every input log file, records
//! the compressed size and wall time of each (file, backend) pair, ranks the
//! results per file and renders them as console, Markdown, HTML, JSON or CSV
//! reports.
//!
//! ## Backends
//!
//! - **Codec**: gzip, bzip2 and xz run in-process at configurable levels
//! - **External**: executables speaking `<exe> compress <in> -o <out>`,
//!   run under a timeout in a scratch directory that is always cleaned up
//! - **Recorded**: sizes from a static baseline table, used when a candidate
//!   cannot run in the current environment
//!
//! A backend whose prerequisites are missing is skipped for the whole run
//! rather than reported as failed. Any other error becomes a failed
//! measurement for that pair and the run carries on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use logbench::{aggregate, render, BenchConfig, BenchRunner, OutputFormat};
//!
//! let config = BenchConfig::default().with_tools_dir("tools");
//! let runner = BenchRunner::new(config);
//!
//! let outcome = runner.run(&["logs/web.log", "logs/sys.log"]);
//! let report = aggregate(&outcome.results, &runner.config().baselines);
//!
//! println!("{}", render(OutputFormat::Console, &report)?);
//! # Ok::<(), logbench::BenchError>(())
//! ```
//!
//! ## Custom Rosters
//!
//! ```rust
//! use logbench::{BackendDescriptor, BenchConfig, BenchRunner, Codec};
//!
//! let roster = vec![
//!     BackendDescriptor::codec("Gzip", Codec::Gzip, 9),
//!     BackendDescriptor::codec("Bzip2", Codec::Bzip2, 9),
//!     BackendDescriptor::external("ULC-C", "ulc-c/ulc", "ulc"),
//! ];
//! let runner = BenchRunner::with_roster(BenchConfig::default(), roster)?;
//! assert_eq!(runner.roster().len(), 3);
//! # Ok::<(), logbench::BenchError>(())
//! ```
//!
//! ## Concurrency
//!
//! Runs are sequential by default. With [`BenchConfig::with_parallelism`]
//! the backends for each file are measured on a bounded thread pool, and
//! the [`ResultRecorder`] accepts concurrent inserts without lost updates.

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod ranking;
pub mod recorder;
pub mod report;
pub mod runner;

pub use backend::{
    standard_roster, Backend, BackendDescriptor, BackendKind, Codec, CodecBackend, ExternalBackend,
    RecordedBackend,
};
pub use config::{BackendSpec, BaselineTable, BenchConfig, ConfigFile, DEFAULT_BASELINES, DEFAULT_TIMEOUT};
pub use error::{BenchError, Result};
pub use model::{FileResultSet, InputFile, Measurement, Origin, Sample};
pub use ranking::{
    aggregate, aggregate_at, compression_ratio, rank_file, space_savings, throughput, BaselineFactor, RankedEntry,
    RankedFile, Report, ReportSummary,
};
pub use recorder::ResultRecorder;
pub use report::{render, OutputFormat};
pub use runner::{
    BackendStatus, BenchRunner, InapplicablePair, NoopObserver, RunObserver, RunOutcome, SkippedBackend, SkippedInput,
};

//! Run orchestration.
//!
//! [`BenchRunner`] discovers the input files, resolves the roster into
//! backends, drops the unavailable ones and measures every remaining
//! (file, backend) pair exactly once. Files are processed in the order they
//! were given; within a file, backends run in registration order, or
//! concurrently on a bounded thread pool when parallelism is enabled.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::backend::{self, standard_roster, validate_roster, Backend, BackendDescriptor, BackendKind};
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::model::{FileResultSet, InputFile, Measurement};
use crate::recorder::ResultRecorder;

/// Progress callbacks fired while a run is in flight.
///
/// Callbacks may arrive from worker threads when parallelism is enabled.
/// All methods default to doing nothing.
pub trait RunObserver: Sync {
    /// About to measure `file`.
    fn on_file_start(&self, _file: &InputFile) {}

    /// A measurement for `file` was recorded.
    fn on_measurement(&self, _file: &InputFile, _measurement: &Measurement) {}

    /// An input path was skipped.
    fn on_file_skipped(&self, _path: &Path, _error: &BenchError) {}

    /// A backend was skipped for the whole run.
    fn on_backend_skipped(&self, _name: &str, _reason: &str) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// An input path that could not be measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedInput {
    /// Path as given by the caller.
    pub path: PathBuf,
    /// Display text of the discovery error.
    pub reason: String,
}

/// A backend left out of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBackend {
    /// Roster name of the backend.
    pub name: String,
    /// Why its availability check failed.
    pub reason: String,
}

/// A (file, backend) pair the backend had nothing to say about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InapplicablePair {
    /// Display name of the input file.
    pub file: String,
    /// Name of the backend that does not cover it.
    pub backend: String,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// One result set per discovered file, in input order.
    pub results: Vec<FileResultSet>,
    /// Input paths that were not found or repeat an earlier entry.
    pub skipped_inputs: Vec<SkippedInput>,
    /// Backends whose prerequisites were absent.
    pub skipped_backends: Vec<SkippedBackend>,
    /// Pairs not measured because the backend does not cover the file.
    pub inapplicable: Vec<InapplicablePair>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl RunOutcome {
    /// Total number of measurements across all files.
    pub fn measurement_count(&self) -> usize {
        self.results.iter().map(FileResultSet::len).sum()
    }
}

/// Availability of one roster entry, as reported by `logbench backends`.
#[derive(Debug, Clone)]
pub struct BackendStatus {
    /// Roster entry as configured.
    pub descriptor: BackendDescriptor,
    /// Kind the descriptor resolved to in this environment.
    pub resolved_as: &'static str,
    /// `None` if the backend can run here.
    pub unavailable: Option<String>,
}

/// Drives one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchRunner {
    config: BenchConfig,
    roster: Vec<BackendDescriptor>,
}

impl BenchRunner {
    /// Runner over the standard roster.
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            roster: standard_roster(),
        }
    }

    /// Runner over a custom roster.
    ///
    /// Fails if two backends share a name or a codec level is out of range.
    pub fn with_roster(config: BenchConfig, roster: Vec<BackendDescriptor>) -> Result<Self> {
        validate_roster(&roster)?;
        Ok(Self { config, roster })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn roster(&self) -> &[BackendDescriptor] {
        &self.roster
    }

    /// Resolve every roster entry and check whether it can run.
    pub fn backend_status(&self) -> Vec<BackendStatus> {
        self.roster
            .iter()
            .map(|descriptor| {
                let backend = backend::resolve(descriptor, &self.config);
                let resolved_as = match backend.descriptor().kind {
                    BackendKind::Codec { .. } => "codec",
                    BackendKind::External { .. } => "external",
                    BackendKind::Recorded => "recorded",
                };
                BackendStatus {
                    descriptor: descriptor.clone(),
                    resolved_as,
                    unavailable: backend.check_available().err().map(|e| e.to_string()),
                }
            })
            .collect()
    }

    /// Run without progress reporting.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> RunOutcome {
        self.run_with(paths, &NoopObserver)
    }

    /// Run, reporting progress to `observer`.
    ///
    /// Never fails: missing or repeated inputs and unavailable backends are
    /// skipped and listed in the outcome, and backend errors become failed
    /// measurements. A file named twice is measured once.
    pub fn run_with<P: AsRef<Path>>(&self, paths: &[P], observer: &dyn RunObserver) -> RunOutcome {
        let start = Instant::now();

        let mut files = Vec::new();
        let mut skipped_inputs = Vec::new();
        let mut seen = HashSet::new();
        for path in paths {
            let path = path.as_ref();
            let discovered = InputFile::discover(path).and_then(|file| {
                let key = fs::canonicalize(&file.path).unwrap_or_else(|_| file.path.clone());
                if seen.insert(key) {
                    Ok(file)
                } else {
                    Err(BenchError::DuplicateInput {
                        path: path.to_path_buf(),
                    })
                }
            });
            match discovered {
                Ok(file) => files.push(file),
                Err(e) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    observer.on_file_skipped(path, &e);
                    skipped_inputs.push(SkippedInput {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut backends: Vec<Box<dyn Backend>> = Vec::new();
        let mut skipped_backends = Vec::new();
        for descriptor in &self.roster {
            let backend = backend::resolve(descriptor, &self.config);
            match backend.check_available() {
                Ok(()) => backends.push(backend),
                Err(e) => {
                    let reason = match &e {
                        BenchError::BackendUnavailable { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    };
                    log::info!("skipping backend {}: {}", descriptor.name, reason);
                    observer.on_backend_skipped(&descriptor.name, &reason);
                    skipped_backends.push(SkippedBackend {
                        name: descriptor.name.clone(),
                        reason,
                    });
                }
            }
        }

        let descriptors: Vec<BackendDescriptor> =
            backends.iter().map(|b| b.descriptor().clone()).collect();
        let recorder = ResultRecorder::new(files.clone(), &descriptors);
        let inapplicable = Mutex::new(Vec::new());

        let pool = self.thread_pool();
        for (file_index, file) in files.iter().enumerate() {
            observer.on_file_start(file);
            let measure = |(order, backend): (usize, &Box<dyn Backend>)| {
                if !backend.applies_to(file) {
                    log::debug!("{} does not cover {}", backend.name(), file.name);
                    inapplicable
                        .lock()
                        .push((file_index, order, file.name.clone(), backend.name().to_string()));
                    return;
                }
                let measurement = backend.measure(file);
                log::debug!(
                    "{} on {}: {}",
                    backend.name(),
                    file.name,
                    match measurement.failure_reason() {
                        Some(reason) => format!("FAILED ({})", reason),
                        None => format!("{} bytes", measurement.compressed_size),
                    }
                );
                observer.on_measurement(file, &measurement);
                recorder.record(file, backend.descriptor(), measurement);
            };

            match &pool {
                Some(pool) => pool.install(|| backends.par_iter().enumerate().for_each(measure)),
                None => backends.iter().enumerate().for_each(measure),
            }
        }

        let mut inapplicable = inapplicable.into_inner();
        // Workers finish in any order.
        inapplicable.sort_by_key(|&(file_index, order, _, _)| (file_index, order));

        let results = recorder.finish();
        let elapsed = start.elapsed();
        let outcome = RunOutcome {
            results,
            skipped_inputs,
            skipped_backends,
            inapplicable: inapplicable
                .into_iter()
                .map(|(_, _, file, backend)| InapplicablePair { file, backend })
                .collect(),
            elapsed,
        };

        log::info!(
            "measured {} files against {} backends ({} measurements) in {:.2}s",
            outcome.results.len(),
            descriptors.len(),
            outcome.measurement_count(),
            elapsed.as_secs_f64()
        );

        outcome
    }

    /// Bounded pool for concurrent measurement, or `None` to run
    /// sequentially.
    fn thread_pool(&self) -> Option<ThreadPool> {
        if self.config.parallelism == 1 {
            return None;
        }
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("logbench-{}", i));
        if self.config.parallelism > 1 {
            builder = builder.num_threads(self.config.parallelism);
        }
        match builder.build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("could not start worker pool, running sequentially: {}", e);
                None
            }
        }
    }
}

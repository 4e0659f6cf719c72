//! Ranking and aggregation.
//!
//! Turns finished result sets into the format-agnostic [`Report`] model.
//! This is the only place ratios, relative factors and bar proportions are
//! computed; renderers only format what they find here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{FileResultSet, InputFile, Measurement};

/// `original / compressed`, undefined for a zero compressed size.
pub fn compression_ratio(original: u64, compressed: u64) -> Option<f64> {
    if compressed == 0 {
        None
    } else {
        Some(original as f64 / compressed as f64)
    }
}

/// Percentage of the original size saved, undefined for an empty original.
pub fn space_savings(original: u64, compressed: u64) -> Option<f64> {
    if original == 0 {
        None
    } else {
        Some((1.0 - compressed as f64 / original as f64) * 100.0)
    }
}

/// Bytes of input processed per second, undefined without a positive time.
pub fn throughput(bytes: u64, secs: Option<f64>) -> Option<f64> {
    match secs {
        Some(secs) if secs > 0.0 => Some(bytes as f64 / secs),
        _ => None,
    }
}

/// Comparison of one entry against one baseline backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineFactor {
    /// Baseline backend name.
    pub baseline: String,
    /// `baseline size / this size`; above 1.0 means smaller than the
    /// baseline. Undefined unless both succeeded.
    pub size_factor: Option<f64>,
    /// `baseline time / this time`; above 1.0 means faster than the
    /// baseline. Undefined unless both were timed.
    pub speedup: Option<f64>,
}

/// A measurement positioned within its file's ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// The underlying measurement.
    pub measurement: Measurement,
    /// Index of the backend in registration order.
    pub registration: usize,
    /// `original / compressed` for successes.
    pub ratio: Option<f64>,
    /// Factors against each configured baseline, in baseline order.
    pub factors: Vec<BaselineFactor>,
    /// Compressed size as a fraction of the largest successful size for
    /// this file, in `(0, 1]`.
    pub relative_size: Option<f64>,
    /// Whether this entry is the file's winner.
    pub is_winner: bool,
    /// Percentage of the original size saved, for successes.
    pub space_savings: Option<f64>,
    /// Original bytes compressed per second.
    pub compress_throughput: Option<f64>,
    /// Original bytes restored per second, when a round trip ran.
    pub decompress_throughput: Option<f64>,
}

impl RankedEntry {
    /// Whether the underlying measurement succeeded.
    pub fn is_success(&self) -> bool {
        self.measurement.is_success()
    }

    /// Backend name.
    pub fn backend(&self) -> &str {
        &self.measurement.backend
    }

    /// Whether the output was decompressed and matched the input.
    pub fn round_trip_verified(&self) -> bool {
        self.is_success() && self.measurement.decompress_secs.is_some()
    }

    /// Factor against the named baseline.
    pub fn factor(&self, baseline: &str) -> Option<&BaselineFactor> {
        self.factors.iter().find(|f| f.baseline == baseline)
    }
}

/// Ranked results for one input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFile {
    /// The measured file.
    pub file: InputFile,
    /// Successes by ascending size, then failures in registration order.
    pub entries: Vec<RankedEntry>,
    /// Name of the smallest successful backend, if any succeeded.
    pub winner: Option<String>,
    /// Largest successful compressed size.
    pub largest_size: Option<u64>,
}

impl RankedFile {
    /// The winning entry.
    pub fn winner_entry(&self) -> Option<&RankedEntry> {
        self.entries.iter().find(|e| e.is_winner)
    }

    /// Entries in backend registration order.
    pub fn in_measurement_order(&self) -> Vec<&RankedEntry> {
        let mut entries: Vec<&RankedEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.registration);
        entries
    }

    /// Number of failed entries.
    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_success()).count()
    }
}

/// Run-level totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Files with a result set.
    pub files: usize,
    /// Measurements across all files.
    pub measurements: usize,
    /// Failed measurements across all files.
    pub failures: usize,
    /// Files with no successful backend.
    pub files_without_winner: usize,
    /// Number of files each backend won.
    pub wins: BTreeMap<String, usize>,
}

/// Aggregated, format-agnostic view of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// When the report was aggregated.
    pub generated_at: DateTime<Utc>,
    /// Baseline backend names, in column order.
    pub baselines: Vec<String>,
    /// One ranked file per input file, in discovery order.
    pub files: Vec<RankedFile>,
    /// Totals.
    pub summary: ReportSummary,
    /// Whether any measurement carries a verified round trip.
    pub round_trip: bool,
}

/// Rank the measurements of one file.
pub fn rank_file(set: &FileResultSet, baselines: &[String]) -> RankedFile {
    let original = set.original_size();

    let mut successes: Vec<(usize, &Measurement)> = Vec::new();
    let mut failures: Vec<(usize, &Measurement)> = Vec::new();
    for (registration, m) in set.measurements.iter().enumerate() {
        if m.is_success() {
            successes.push((registration, m));
        } else {
            failures.push((registration, m));
        }
    }
    successes.sort_by_key(|&(registration, m)| (m.compressed_size, registration));

    let largest_size = successes.iter().map(|(_, m)| m.compressed_size).max();

    let baseline_results: Vec<(&String, Option<&Measurement>)> = baselines
        .iter()
        .map(|name| (name, set.get(name).filter(|m| m.is_success())))
        .collect();

    let winner = successes.first().map(|(_, m)| m.backend.clone());

    let entries = successes
        .into_iter()
        .chain(failures)
        .map(|(registration, m)| {
            let success = m.is_success();
            let factors = baseline_results
                .iter()
                .map(|&(name, baseline)| BaselineFactor {
                    baseline: name.clone(),
                    size_factor: match baseline {
                        Some(b) if success => compression_ratio(b.compressed_size, m.compressed_size),
                        _ => None,
                    },
                    speedup: match (baseline.and_then(|b| b.elapsed_secs), m.elapsed_secs) {
                        (Some(base), Some(this)) if success && base > 0.0 && this > 0.0 => {
                            Some(base / this)
                        }
                        _ => None,
                    },
                })
                .collect();

            RankedEntry {
                measurement: m.clone(),
                registration,
                ratio: if success {
                    compression_ratio(original, m.compressed_size)
                } else {
                    None
                },
                factors,
                relative_size: match largest_size {
                    Some(largest) if success => Some(m.compressed_size as f64 / largest as f64),
                    _ => None,
                },
                is_winner: success && winner.as_deref() == Some(m.backend.as_str()),
                space_savings: if success {
                    space_savings(original, m.compressed_size)
                } else {
                    None
                },
                compress_throughput: throughput(original, m.elapsed_secs),
                decompress_throughput: throughput(original, m.decompress_secs),
            }
        })
        .collect();

    RankedFile {
        file: set.file.clone(),
        entries,
        winner,
        largest_size,
    }
}

/// Aggregate a run's result sets into a report stamped with the current
/// time.
pub fn aggregate(results: &[FileResultSet], baselines: &[String]) -> Report {
    aggregate_at(results, baselines, Utc::now())
}

/// Aggregate with an explicit timestamp.
pub fn aggregate_at(results: &[FileResultSet], baselines: &[String], generated_at: DateTime<Utc>) -> Report {
    let files: Vec<RankedFile> = results.iter().map(|set| rank_file(set, baselines)).collect();

    let mut summary = ReportSummary {
        files: files.len(),
        ..ReportSummary::default()
    };
    for file in &files {
        summary.measurements += file.entries.len();
        summary.failures += file.failure_count();
        match &file.winner {
            Some(winner) => *summary.wins.entry(winner.clone()).or_default() += 1,
            None => summary.files_without_winner += 1,
        }
    }

    let round_trip = files
        .iter()
        .flat_map(|f| &f.entries)
        .any(RankedEntry::round_trip_verified);

    Report {
        generated_at,
        baselines: baselines.to_vec(),
        files,
        summary,
        round_trip,
    }
}

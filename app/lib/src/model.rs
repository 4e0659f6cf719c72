//! Core data model: input files, measurements and per-file result sets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// A log file taking part in the run.
///
/// Immutable once discovered; the original size is captured at discovery
/// time and is what every ratio is computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Display name (the file name component of the path).
    pub name: String,
    /// Filesystem path handed to backends.
    pub path: PathBuf,
    /// Size of the file in bytes.
    pub original_size: u64,
}

impl InputFile {
    /// Look up `path` and capture its name and size.
    ///
    /// Returns [`BenchError::MissingInput`] when the path does not exist or
    /// is not a regular file.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                return Err(BenchError::MissingInput {
                    path: path.to_path_buf(),
                })
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            path: path.to_path_buf(),
            original_size: metadata.len(),
        })
    }
}

/// How a measurement was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// In-process library codec.
    Codec,
    /// External executable.
    External,
    /// Static baseline table, not measured in this run.
    Recorded,
}

impl Origin {
    /// Short lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Codec => "codec",
            Origin::External => "external",
            Origin::Recorded => "recorded",
        }
    }
}

/// Raw numbers produced by a successful adapter invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Size of the compressed output in bytes.
    pub compressed_size: u64,
    /// Time spent in the compress call, if it was timed.
    pub elapsed: Option<Duration>,
    /// Time spent decompressing, if a round trip ran.
    pub decompress_elapsed: Option<Duration>,
}

impl Sample {
    /// A timed compression with no round trip.
    pub fn timed(compressed_size: u64, elapsed: Duration) -> Self {
        Self {
            compressed_size,
            elapsed: Some(elapsed),
            decompress_elapsed: None,
        }
    }
}

/// Outcome of applying one backend to one input file.
///
/// A failed measurement always has `compressed_size == 0` and a non-empty
/// `failure` reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Name of the backend that produced this measurement.
    pub backend: String,
    /// How the backend was realized.
    pub origin: Origin,
    /// Compressed size in bytes, 0 on failure.
    pub compressed_size: u64,
    /// Compression wall time in seconds. `None` for recorded baselines and
    /// failures.
    pub elapsed_secs: Option<f64>,
    /// Decompression wall time in seconds when a round trip was verified.
    pub decompress_secs: Option<f64>,
    /// Failure reason; `None` on success.
    pub failure: Option<String>,
}

impl Measurement {
    /// Build a measurement from an adapter result.
    ///
    /// A sample with a zero compressed size is not accepted as success.
    pub fn from_outcome(backend: impl Into<String>, origin: Origin, outcome: Result<Sample>) -> Self {
        let backend = backend.into();
        match outcome {
            Ok(sample) if sample.compressed_size == 0 => Self::failed(
                backend,
                origin,
                &BenchError::malformed("backend produced zero bytes"),
            ),
            Ok(sample) => Self {
                backend,
                origin,
                compressed_size: sample.compressed_size,
                elapsed_secs: sample.elapsed.map(|d| d.as_secs_f64()),
                decompress_secs: sample.decompress_elapsed.map(|d| d.as_secs_f64()),
                failure: None,
            },
            Err(error) => Self::failed(backend, origin, &error),
        }
    }

    /// A failed measurement carrying the error's description.
    pub fn failed(backend: impl Into<String>, origin: Origin, error: &BenchError) -> Self {
        let mut reason = error.to_string();
        if reason.is_empty() {
            reason = "unknown failure".to_string();
        }
        Self {
            backend: backend.into(),
            origin,
            compressed_size: 0,
            elapsed_secs: None,
            decompress_secs: None,
            failure: Some(reason),
        }
    }

    /// Whether the backend succeeded.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

/// All measurements taken for one input file.
///
/// Measurements are kept in backend registration order and keyed uniquely
/// by backend name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResultSet {
    /// The measured file.
    pub file: InputFile,
    /// One measurement per backend that ran, in registration order.
    pub measurements: Vec<Measurement>,
}

impl FileResultSet {
    /// Create an empty result set for `file`.
    pub fn new(file: InputFile) -> Self {
        Self {
            file,
            measurements: Vec::new(),
        }
    }

    /// Original size of the file.
    pub fn original_size(&self) -> u64 {
        self.file.original_size
    }

    /// Measurement for the named backend.
    pub fn get(&self, backend: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.backend == backend)
    }

    /// Number of measurements.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// Returns true if no backend was measured for this file.
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_discover_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"line one\nline two\n").unwrap();

        let input = InputFile::discover(file.path()).unwrap();
        assert_eq!(input.original_size, 18);
        assert_eq!(input.path, file.path());
        assert!(!input.name.is_empty());
    }

    #[test]
    fn test_discover_missing_file() {
        let result = InputFile::discover("definitely/not/here.log");
        assert!(matches!(result, Err(BenchError::MissingInput { .. })));
    }

    #[test]
    fn test_discover_directory_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = InputFile::discover(dir.path());
        assert!(matches!(result, Err(BenchError::MissingInput { .. })));
    }

    #[test]
    fn test_measurement_success() {
        let m = Measurement::from_outcome(
            "Gzip",
            Origin::Codec,
            Ok(Sample::timed(1234, Duration::from_millis(500))),
        );
        assert!(m.is_success());
        assert_eq!(m.compressed_size, 1234);
        assert_eq!(m.elapsed_secs, Some(0.5));
        assert_eq!(m.failure_reason(), None);
    }

    #[test]
    fn test_measurement_failure_has_zero_size_and_reason() {
        let m = Measurement::from_outcome(
            "ULC-C",
            Origin::External,
            Err(BenchError::invocation("exit status 1")),
        );
        assert!(!m.is_success());
        assert_eq!(m.compressed_size, 0);
        assert!(!m.failure_reason().unwrap().is_empty());
    }

    #[test]
    fn test_zero_size_sample_is_failure() {
        let m = Measurement::from_outcome(
            "Broken",
            Origin::Codec,
            Ok(Sample::timed(0, Duration::from_millis(1))),
        );
        assert!(!m.is_success());
        assert!(m.failure_reason().unwrap().contains("malformed"));
    }

    #[test]
    fn test_result_set_lookup() {
        let file = InputFile {
            name: "web.log".to_string(),
            path: PathBuf::from("web.log"),
            original_size: 100,
        };
        let mut set = FileResultSet::new(file);
        assert!(set.is_empty());
        set.measurements.push(Measurement::from_outcome(
            "Gzip",
            Origin::Codec,
            Ok(Sample::timed(10, Duration::ZERO)),
        ));
        assert_eq!(set.len(), 1);
        assert_eq!(set.original_size(), 100);
        assert!(set.get("Gzip").is_some());
        assert!(set.get("LZMA").is_none());
    }
}

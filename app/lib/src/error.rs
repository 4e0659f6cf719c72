//! Error types for the logbench harness.
//!
//! Backend-level variants never escape a measurement: adapters convert them
//! into failed [`Measurement`](crate::Measurement)s whose failure reason is
//! the error's display text. The remaining variants surface from
//! configuration loading and report writing.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for the logbench library.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A backend's prerequisite (executable, library) is missing.
    ///
    /// The backend is excluded from the run for every file rather than
    /// being recorded as failed.
    #[error("backend '{name}' unavailable: {reason}")]
    BackendUnavailable {
        /// Backend name
        name: String,
        /// Why the prerequisite check failed
        reason: String,
    },

    /// The backend was invoked and broke: non-zero exit, spawn failure,
    /// or an in-process codec error.
    #[error("invocation failed: {message}")]
    InvocationFailure {
        /// Captured diagnostic text
        message: String,
    },

    /// An external process exceeded its time limit and was killed.
    #[error("timeout")]
    TimeoutExceeded {
        /// The limit that was exceeded
        limit: Duration,
    },

    /// A declared input file does not exist.
    #[error("input file not found: {}", path.display())]
    MissingInput {
        /// Path that was looked up
        path: PathBuf,
    },

    /// An input path named a file already taken into the run.
    #[error("input file listed more than once: {}", path.display())]
    DuplicateInput {
        /// Path of the repeated entry
        path: PathBuf,
    },

    /// The backend reported success but its output artifact is empty or
    /// absent.
    #[error("malformed output: {message}")]
    MalformedOutput {
        /// What was wrong with the artifact
        message: String,
    },

    /// Decompressing the backend's output did not reproduce the input.
    #[error("round trip mismatch: {message}")]
    RoundTripMismatch {
        /// What differed
        message: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Shorthand for an [`InvocationFailure`](Self::InvocationFailure).
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::InvocationFailure {
            message: message.into(),
        }
    }

    /// Shorthand for a [`MalformedOutput`](Self::MalformedOutput).
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            message: message.into(),
        }
    }

    /// Returns true if this error means the backend could not run at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

/// Type alias for Results using `BenchError`.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_is_bare() {
        let error = BenchError::TimeoutExceeded {
            limit: Duration::from_secs(60),
        };
        assert_eq!(error.to_string(), "timeout");
    }

    #[test]
    fn test_backend_unavailable_display() {
        let error = BenchError::BackendUnavailable {
            name: "ULC-C".to_string(),
            reason: "executable not found".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("'ULC-C'"));
        assert!(display.contains("executable not found"));
        assert!(error.is_unavailable());
    }

    #[test]
    fn test_invocation_failure_display() {
        let error = BenchError::invocation("exit status 3: bad header");
        assert_eq!(error.to_string(), "invocation failed: exit status 3: bad header");
        assert!(!error.is_unavailable());
    }

    #[test]
    fn test_missing_input_display() {
        let error = BenchError::MissingInput {
            path: PathBuf::from("logs/web.txt"),
        };
        assert!(error.to_string().contains("logs/web.txt"));
    }

    #[test]
    fn test_duplicate_input_display() {
        let error = BenchError::DuplicateInput {
            path: PathBuf::from("logs/web.txt"),
        };
        assert_eq!(error.to_string(), "input file listed more than once: logs/web.txt");
    }

    #[test]
    fn test_malformed_output_display() {
        let error = BenchError::malformed("output artifact is empty");
        assert!(error.to_string().starts_with("malformed output"));
    }

    #[test]
    fn test_json_error_from() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: BenchError = json_error.into();
        assert!(matches!(error, BenchError::Json(_)));
    }

    #[test]
    fn test_io_error_from() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: BenchError = io_error.into();
        assert!(matches!(error, BenchError::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BenchError>();
    }
}

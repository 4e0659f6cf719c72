//! Backend adapters.
//!
//! Every compression method under comparison is wrapped in a [`Backend`].
//! The orchestrator only ever calls [`Backend::measure`]; whether the method
//! is an in-process codec, an external executable or a recorded baseline is
//! decided once, when the descriptor is resolved.

mod codec;
mod external;
mod recorded;
mod roster;

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::model::{InputFile, Measurement};

pub use codec::CodecBackend;
pub use external::ExternalBackend;
pub use recorded::RecordedBackend;
pub use roster::standard_roster;

/// Standard codecs available in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// DEFLATE in a gzip container.
    Gzip,
    /// Burrows-Wheeler bzip2.
    Bzip2,
    /// LZMA2 in an xz container.
    Xz,
}

impl Codec {
    /// Lowest and highest accepted effort levels.
    pub fn level_range(&self) -> (u32, u32) {
        match self {
            Codec::Gzip => (0, 9),
            Codec::Bzip2 => (1, 9),
            Codec::Xz => (0, 9),
        }
    }

    /// Check that `level` is accepted by this codec.
    pub fn validate_level(&self, level: u32) -> Result<()> {
        let (min, max) = self.level_range();
        if level < min || level > max {
            return Err(BenchError::Config(format!(
                "{} level must be in {}..={}, got {}",
                self, min, max, level
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::Gzip => "gzip",
            Codec::Bzip2 => "bzip2",
            Codec::Xz => "xz",
        })
    }
}

/// How a backend is invoked, with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendKind {
    /// Library call on the file bytes.
    Codec {
        /// Codec to run
        codec: Codec,
        /// Effort level
        level: u32,
        /// xz "extreme" preset flag; ignored by other codecs
        extreme: bool,
    },
    /// Separate executable speaking the `compress <in> -o <out>` protocol.
    External {
        /// Executable path, relative to the tools directory unless absolute
        executable: PathBuf,
        /// Extension given to the output artifact
        extension: String,
        /// Per-backend time limit; falls back to the run-wide timeout
        timeout: Option<Duration>,
    },
    /// Sizes looked up in the recorded baseline table.
    Recorded,
}

/// Static identity and parameters of one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendDescriptor {
    /// Unique backend name, used as the key in result sets and reports.
    pub name: String,
    /// Invocation kind.
    pub kind: BackendKind,
}

impl BackendDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// In-process codec descriptor.
    pub fn codec(name: impl Into<String>, codec: Codec, level: u32) -> Self {
        Self::new(
            name,
            BackendKind::Codec {
                codec,
                level,
                extreme: false,
            },
        )
    }

    /// External executable descriptor using the run-wide timeout.
    pub fn external(name: impl Into<String>, executable: impl Into<PathBuf>, extension: &str) -> Self {
        Self::new(
            name,
            BackendKind::External {
                executable: executable.into(),
                extension: extension.to_string(),
                timeout: None,
            },
        )
    }
}

/// One compression method under comparison.
///
/// Implementations must never panic or return early on backend errors:
/// every failure becomes a failed [`Measurement`]. Scratch artifacts must be
/// gone by the time `measure` returns.
pub trait Backend: Send + Sync {
    /// Static identity of this backend.
    fn descriptor(&self) -> &BackendDescriptor;

    /// Backend name.
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Check the backend's prerequisites.
    ///
    /// Returns [`BenchError::BackendUnavailable`] when the backend cannot
    /// run in this environment; such a backend is skipped for every file.
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Whether this backend has anything to say about `file`.
    fn applies_to(&self, _file: &InputFile) -> bool {
        true
    }

    /// Compress `file` once and report the outcome.
    fn measure(&self, file: &InputFile) -> Measurement;
}

/// Build the adapter for `descriptor`.
///
/// An external backend whose executable is missing is replaced by a
/// [`RecordedBackend`] when the recorded table has sizes under the same
/// name, so a candidate that cannot be built here still shows up with its
/// historical numbers.
pub fn resolve(descriptor: &BackendDescriptor, config: &BenchConfig) -> Box<dyn Backend> {
    match &descriptor.kind {
        BackendKind::Codec { .. } => Box::new(CodecBackend::new(descriptor.clone(), config)),
        BackendKind::External { .. } => {
            let backend = ExternalBackend::new(descriptor.clone(), config);
            if backend.check_available().is_err() && config.recorded.has_backend(&descriptor.name) {
                log::info!(
                    "{}: executable not found, using recorded baseline sizes",
                    descriptor.name
                );
                return Box::new(RecordedBackend::from_table(&descriptor.name, &config.recorded));
            }
            Box::new(backend)
        }
        BackendKind::Recorded => Box::new(RecordedBackend::from_table(&descriptor.name, &config.recorded)),
    }
}

/// Compare decompressed bytes with the original input.
pub(crate) fn compare_round_trip(original: &[u8], restored: &[u8]) -> Result<()> {
    if let Some(offset) = original.iter().zip(restored).position(|(a, b)| a != b) {
        return Err(BenchError::RoundTripMismatch {
            message: format!("first difference at byte {}", offset),
        });
    }
    if original.len() != restored.len() {
        return Err(BenchError::RoundTripMismatch {
            message: format!(
                "expected {} bytes, decompressed {}",
                original.len(),
                restored.len()
            ),
        });
    }
    Ok(())
}

/// Reject rosters with repeated backend names.
pub fn check_unique_names(descriptors: &[BackendDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();
    for descriptor in descriptors {
        if !seen.insert(descriptor.name.as_str()) {
            return Err(BenchError::Config(format!(
                "duplicate backend name '{}'",
                descriptor.name
            )));
        }
    }
    Ok(())
}

/// Reject rosters with repeated names or out-of-range codec levels.
pub fn validate_roster(descriptors: &[BackendDescriptor]) -> Result<()> {
    check_unique_names(descriptors)?;
    for descriptor in descriptors {
        if let BackendKind::Codec { codec, level, .. } = descriptor.kind {
            codec
                .validate_level(level)
                .map_err(|e| BenchError::Config(format!("backend '{}': {}", descriptor.name, e)))?;
        }
    }
    Ok(())
}

//! Configuration types for the benchmark harness.
//!
//! [`BenchConfig`] holds the run-wide settings and is built with the usual
//! `with_*` methods. [`ConfigFile`] is its JSON form, which may also replace
//! the backend roster. [`BaselineTable`] is the injected table of historical
//! compressed sizes used when a backend cannot be run live.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::{BackendDescriptor, BackendKind, Codec};
use crate::error::{BenchError, Result};

/// Default time limit for a single external invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default baselines for relative factors.
pub const DEFAULT_BASELINES: [&str; 2] = ["Gzip", "LZMA"];

/// Run-wide settings.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Time limit for each external process invocation.
    ///
    /// Individual external backends may override it.
    ///
    /// Default: 60 seconds
    pub timeout: Duration,

    /// Decompress each backend's output and compare it with the input.
    ///
    /// Default: false
    pub verify_round_trip: bool,

    /// Number of (file, backend) pairs measured concurrently.
    ///
    /// - 0: one worker per CPU core
    /// - 1: sequential (reference behavior)
    /// - N: at most N concurrent measurements
    ///
    /// Default: 1
    pub parallelism: usize,

    /// Backends that relative factors are computed against, in column order.
    ///
    /// Default: `["Gzip", "LZMA"]`
    pub baselines: Vec<String>,

    /// Directory relative executable paths are resolved against.
    ///
    /// Default: current directory
    pub tools_dir: PathBuf,

    /// Parent directory for per-invocation scratch directories.
    ///
    /// Default: the system temporary directory
    pub scratch_dir: Option<PathBuf>,

    /// Historical sizes for backends that cannot run live.
    pub recorded: BaselineTable,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verify_round_trip: false,
            parallelism: 1,
            baselines: DEFAULT_BASELINES.iter().map(|s| s.to_string()).collect(),
            tools_dir: PathBuf::from("."),
            scratch_dir: None,
            recorded: BaselineTable::default(),
        }
    }
}

impl BenchConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the external process time limit.
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "timeout must be non-zero");
        self.timeout = timeout;
        self
    }

    /// Enable or disable round-trip verification.
    pub fn with_verify_round_trip(mut self, verify: bool) -> Self {
        self.verify_round_trip = verify;
        self
    }

    /// Set the parallelism level.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the baseline backends.
    pub fn with_baselines<I, S>(mut self, baselines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baselines = baselines.into_iter().map(Into::into).collect();
        self
    }

    /// Set the tools directory.
    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = dir.into();
        self
    }

    /// Set the scratch directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Set the recorded baseline table.
    pub fn with_recorded(mut self, table: BaselineTable) -> Self {
        self.recorded = table;
        self
    }

    /// Resolve an executable path against the tools directory, appending the
    /// platform executable suffix when the path has no extension.
    pub fn resolve_executable(&self, executable: &Path) -> PathBuf {
        let mut path = if executable.is_absolute() {
            executable.to_path_buf()
        } else {
            self.tools_dir.join(executable)
        };
        let suffix = std::env::consts::EXE_EXTENSION;
        if !suffix.is_empty() && path.extension().is_none() {
            path.set_extension(suffix);
        }
        path
    }
}

/// Historical compressed sizes: backend name → file name → size in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineTable {
    entries: BTreeMap<String, BTreeMap<String, u64>>,
}

impl BaselineTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from JSON of the form `{"backend": {"file": size}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Record a size for `backend` on `file`.
    pub fn insert(&mut self, backend: impl Into<String>, file: impl Into<String>, size: u64) {
        self.entries
            .entry(backend.into())
            .or_default()
            .insert(file.into(), size);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_entry(mut self, backend: impl Into<String>, file: impl Into<String>, size: u64) -> Self {
        self.insert(backend, file, size);
        self
    }

    /// Recorded size for `backend` on `file`.
    pub fn get(&self, backend: &str, file: &str) -> Option<u64> {
        self.entries.get(backend).and_then(|files| files.get(file)).copied()
    }

    /// Whether any size is recorded for `backend`.
    pub fn has_backend(&self, backend: &str) -> bool {
        self.entries.get(backend).is_some_and(|files| !files.is_empty())
    }

    /// Sizes recorded for `backend`.
    pub fn sizes_for(&self, backend: &str) -> BTreeMap<String, u64> {
        self.entries.get(backend).cloned().unwrap_or_default()
    }

    /// Merge `other` into this table; entries in `other` win.
    pub fn merge(&mut self, other: BaselineTable) {
        for (backend, files) in other.entries {
            self.entries.entry(backend).or_default().extend(files);
        }
    }

    /// Returns true if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }
}

/// JSON configuration file.
///
/// Every field is optional and overrides the corresponding
/// [`BenchConfig`] value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// External process time limit in seconds.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Round-trip verification.
    #[serde(default)]
    pub verify_round_trip: Option<bool>,
    /// Parallelism level.
    #[serde(default)]
    pub parallelism: Option<usize>,
    /// Baseline backend names.
    #[serde(default)]
    pub baselines: Option<Vec<String>>,
    /// Tools directory.
    #[serde(default)]
    pub tools_dir: Option<PathBuf>,
    /// Scratch directory.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    /// Replacement backend roster.
    #[serde(default)]
    pub backends: Option<Vec<BackendSpec>>,
    /// Recorded baseline sizes.
    #[serde(default)]
    pub recorded: Option<BaselineTable>,
}

/// One backend entry in a [`ConfigFile`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendSpec {
    /// In-process codec.
    Codec {
        /// Backend name
        name: String,
        /// Codec to use
        codec: Codec,
        /// Effort level
        #[serde(default = "default_level")]
        level: u32,
        /// xz "extreme" preset flag
        #[serde(default)]
        extreme: bool,
    },
    /// External executable.
    External {
        /// Backend name
        name: String,
        /// Executable path, relative to the tools directory unless absolute
        executable: PathBuf,
        /// Output file extension
        #[serde(default)]
        extension: Option<String>,
        /// Time limit override in seconds
        #[serde(default)]
        timeout_secs: Option<f64>,
    },
    /// Sizes taken from the recorded baseline table.
    Recorded {
        /// Backend name
        name: String,
    },
}

fn default_level() -> u32 {
    9
}

fn parse_timeout(secs: f64) -> Result<Duration> {
    if secs <= 0.0 {
        return Err(BenchError::Config(format!(
            "timeout must be positive, got {}",
            secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| BenchError::Config(format!("invalid timeout {}: {}", secs, e)))
}

impl BackendSpec {
    /// Convert into a descriptor, validating parameters.
    pub fn into_descriptor(self) -> Result<BackendDescriptor> {
        match self {
            BackendSpec::Codec {
                name,
                codec,
                level,
                extreme,
            } => {
                codec.validate_level(level)?;
                Ok(BackendDescriptor::new(
                    name,
                    BackendKind::Codec {
                        codec,
                        level,
                        extreme,
                    },
                ))
            }
            BackendSpec::External {
                name,
                executable,
                extension,
                timeout_secs,
            } => {
                let timeout = timeout_secs.map(parse_timeout).transpose()?;
                Ok(BackendDescriptor::new(
                    name,
                    BackendKind::External {
                        executable,
                        extension: extension.unwrap_or_else(|| "out".to_string()),
                        timeout,
                    },
                ))
            }
            BackendSpec::Recorded { name } => Ok(BackendDescriptor::new(name, BackendKind::Recorded)),
        }
    }
}

impl ConfigFile {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply the overrides to `config`, returning the updated configuration
    /// and the replacement roster, if the file declares one.
    pub fn apply(self, mut config: BenchConfig) -> Result<(BenchConfig, Option<Vec<BackendDescriptor>>)> {
        if let Some(secs) = self.timeout_secs {
            config.timeout = parse_timeout(secs)?;
        }
        if let Some(verify) = self.verify_round_trip {
            config.verify_round_trip = verify;
        }
        if let Some(parallelism) = self.parallelism {
            config.parallelism = parallelism;
        }
        if let Some(baselines) = self.baselines {
            config.baselines = baselines;
        }
        if let Some(dir) = self.tools_dir {
            config.tools_dir = dir;
        }
        if let Some(dir) = self.scratch_dir {
            config.scratch_dir = Some(dir);
        }
        if let Some(recorded) = self.recorded {
            config.recorded.merge(recorded);
        }

        let roster = match self.backends {
            Some(specs) => {
                let descriptors = specs
                    .into_iter()
                    .map(BackendSpec::into_descriptor)
                    .collect::<Result<Vec<_>>>()?;
                crate::backend::check_unique_names(&descriptors)?;
                Some(descriptors)
            }
            None => None,
        };

        Ok((config, roster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_config_default() {
        let config = BenchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(!config.verify_round_trip);
        assert_eq!(config.parallelism, 1);
        assert_eq!(config.baselines, vec!["Gzip", "LZMA"]);
        assert_eq!(config.tools_dir, PathBuf::from("."));
        assert!(config.scratch_dir.is_none());
        assert!(config.recorded.is_empty());
    }

    #[test]
    fn test_bench_config_builder() {
        let config = BenchConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_verify_round_trip(true)
            .with_parallelism(4)
            .with_baselines(["Bzip2"])
            .with_tools_dir("/opt/tools")
            .with_scratch_dir("/tmp/scratch");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.verify_round_trip);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.baselines, vec!["Bzip2"]);
        assert_eq!(config.tools_dir, PathBuf::from("/opt/tools"));
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/tmp/scratch")));
    }

    #[test]
    #[should_panic(expected = "timeout must be non-zero")]
    fn test_zero_timeout_panics() {
        BenchConfig::new().with_timeout(Duration::ZERO);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_executable() {
        let config = BenchConfig::new().with_tools_dir("/opt/ulc");
        assert_eq!(
            config.resolve_executable(Path::new("bin/ulc-hyper")),
            PathBuf::from("/opt/ulc/bin/ulc-hyper")
        );
        assert_eq!(
            config.resolve_executable(Path::new("/usr/bin/xz")),
            PathBuf::from("/usr/bin/xz")
        );
    }

    #[test]
    fn test_baseline_table_from_json() {
        let table = BaselineTable::from_json_str(
            r#"{"ULC-Hyper": {"test_log_web.txt": 6504, "test_log_sys.txt": 9104}}"#,
        )
        .unwrap();
        assert_eq!(table.get("ULC-Hyper", "test_log_web.txt"), Some(6504));
        assert_eq!(table.get("ULC-Hyper", "test_log_app.txt"), None);
        assert_eq!(table.get("Gzip", "test_log_web.txt"), None);
        assert!(table.has_backend("ULC-Hyper"));
        assert!(!table.has_backend("Gzip"));
        assert_eq!(table.sizes_for("ULC-Hyper").len(), 2);
    }

    #[test]
    fn test_baseline_table_merge() {
        let mut table = BaselineTable::new().with_entry("A", "x.log", 10);
        table.merge(BaselineTable::new().with_entry("A", "x.log", 20).with_entry("B", "y.log", 5));
        assert_eq!(table.get("A", "x.log"), Some(20));
        assert_eq!(table.get("B", "y.log"), Some(5));
    }

    #[test]
    fn test_config_file_overrides() {
        let file = ConfigFile::from_json_str(
            r#"{
                "timeout_secs": 2.5,
                "verify_round_trip": true,
                "parallelism": 3,
                "baselines": ["Bzip2", "Gzip"],
                "recorded": {"ULC-Hyper": {"a.log": 42}}
            }"#,
        )
        .unwrap();
        let (config, roster) = file.apply(BenchConfig::default()).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert!(config.verify_round_trip);
        assert_eq!(config.parallelism, 3);
        assert_eq!(config.baselines, vec!["Bzip2", "Gzip"]);
        assert_eq!(config.recorded.get("ULC-Hyper", "a.log"), Some(42));
        assert!(roster.is_none());
    }

    #[test]
    fn test_config_file_roster() {
        let file = ConfigFile::from_json_str(
            r#"{
                "backends": [
                    {"kind": "codec", "name": "Gzip", "codec": "gzip", "level": 6},
                    {"kind": "codec", "name": "XZ", "codec": "xz", "extreme": true},
                    {"kind": "external", "name": "ULC-C", "executable": "ulc-c/ulc", "extension": "ulc", "timeout_secs": 30},
                    {"kind": "recorded", "name": "ULC-Hyper"}
                ]
            }"#,
        )
        .unwrap();
        let (_, roster) = file.apply(BenchConfig::default()).unwrap();
        let roster = roster.unwrap();
        assert_eq!(roster.len(), 4);
        assert_eq!(roster[0].name, "Gzip");
        assert_eq!(
            roster[1].kind,
            BackendKind::Codec {
                codec: Codec::Xz,
                level: 9,
                extreme: true
            }
        );
        assert_eq!(
            roster[2].kind,
            BackendKind::External {
                executable: PathBuf::from("ulc-c/ulc"),
                extension: "ulc".to_string(),
                timeout: Some(Duration::from_secs(30)),
            }
        );
        assert_eq!(roster[3].kind, BackendKind::Recorded);
    }

    #[test]
    fn test_config_file_rejects_unknown_fields() {
        assert!(ConfigFile::from_json_str(r#"{"timeout": 5}"#).is_err());
    }

    #[test]
    fn test_config_file_rejects_negative_timeout() {
        let file = ConfigFile::from_json_str(r#"{"timeout_secs": -1}"#).unwrap();
        assert!(matches!(
            file.apply(BenchConfig::default()),
            Err(BenchError::Config(_))
        ));
    }

    #[test]
    fn test_config_file_rejects_bad_level() {
        let file = ConfigFile::from_json_str(
            r#"{"backends": [{"kind": "codec", "name": "Gzip", "codec": "gzip", "level": 42}]}"#,
        )
        .unwrap();
        assert!(file.apply(BenchConfig::default()).is_err());
    }

    #[test]
    fn test_config_file_rejects_duplicate_names() {
        let file = ConfigFile::from_json_str(
            r#"{"backends": [
                {"kind": "codec", "name": "Gzip", "codec": "gzip"},
                {"kind": "codec", "name": "Gzip", "codec": "bzip2"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            file.apply(BenchConfig::default()),
            Err(BenchError::Config(_))
        ));
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BenchConfig>();
        assert_send_sync::<BaselineTable>();
    }
}

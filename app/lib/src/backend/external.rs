//! External-process adapter.
//!
//! Runs `<exe> compress <input> -o <output>` inside a scratch directory that
//! is removed when the measurement returns, whatever the outcome. The timer
//! covers only the wait on the child process.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::backend::{compare_round_trip, Backend, BackendDescriptor, BackendKind};
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::model::{InputFile, Measurement, Origin, Sample};

/// Longest sleep between exit-status polls.
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest diagnostic excerpt kept from the child's stderr.
const MAX_DIAGNOSTIC_LEN: usize = 240;

/// Backend that shells out to a compressor executable.
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    descriptor: BackendDescriptor,
    executable: PathBuf,
    extension: String,
    timeout: Duration,
    verify: bool,
    scratch_dir: Option<PathBuf>,
}

impl ExternalBackend {
    /// Create the adapter, resolving the executable against the tools
    /// directory.
    ///
    /// # Panics
    ///
    /// Panics if `descriptor` is not an external descriptor.
    pub fn new(descriptor: BackendDescriptor, config: &BenchConfig) -> Self {
        let (executable, extension, timeout) = match &descriptor.kind {
            BackendKind::External {
                executable,
                extension,
                timeout,
            } => (
                config.resolve_executable(executable),
                extension.clone(),
                timeout.unwrap_or(config.timeout),
            ),
            other => panic!("ExternalBackend requires an external descriptor, got {:?}", other),
        };
        Self {
            descriptor,
            executable,
            extension,
            timeout,
            verify: config.verify_round_trip,
            scratch_dir: config.scratch_dir.clone(),
        }
    }

    /// Resolved path of the executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Time limit applied to each invocation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn scratch(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("logbench-");
        let dir = match &self.scratch_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn run(&self, file: &InputFile) -> Result<Sample> {
        // Dropping `scratch` removes every artifact on all exit paths.
        let scratch = self.scratch()?;
        let stem = file
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        let output = scratch.path().join(format!("{}.{}", stem, self.extension));

        let elapsed = self.invoke("compress", &file.path, &output, scratch.path())?;

        let size = match fs::metadata(&output) {
            Ok(metadata) => metadata.len(),
            Err(_) => return Err(BenchError::malformed("no output artifact was produced")),
        };
        if size == 0 {
            return Err(BenchError::malformed("output artifact is empty"));
        }

        let mut sample = Sample::timed(size, elapsed);

        if self.verify {
            let restored = scratch.path().join(format!("{}.restored", stem));
            sample.decompress_elapsed =
                Some(self.invoke("decompress", &output, &restored, scratch.path())?);

            let original = fs::read(&file.path)?;
            let restored = fs::read(&restored)
                .map_err(|_| BenchError::malformed("decompress produced no output"))?;
            compare_round_trip(&original, &restored)?;
        }

        Ok(sample)
    }

    /// Run one protocol action and return how long the process took.
    fn invoke(&self, action: &str, input: &Path, output: &Path, scratch: &Path) -> Result<Duration> {
        let stderr_path = scratch.join(format!("{}.stderr", action));
        let stderr = File::create(&stderr_path)?;

        let mut child = Command::new(&self.executable)
            .arg(action)
            .arg(input)
            .arg("-o")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| {
                BenchError::invocation(format!(
                    "failed to spawn {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        let start = Instant::now();
        let status = wait_with_timeout(&mut child, self.timeout)?;
        let elapsed = start.elapsed();

        if !status.success() {
            let mut message = format!("{} exited with {}", action, status);
            if let Some(diagnostic) = read_diagnostic(&stderr_path) {
                message.push_str(": ");
                message.push_str(&diagnostic);
            }
            return Err(BenchError::invocation(message));
        }

        Ok(elapsed)
    }
}

/// Wait for `child` to exit, killing it once `limit` has passed.
fn wait_with_timeout(child: &mut Child, limit: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + limit;
    let mut interval = Duration::from_millis(1);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }

        let now = Instant::now();
        if now >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BenchError::TimeoutExceeded { limit });
        }

        thread::sleep(interval.min(deadline - now));
        interval = (interval * 2).min(MAX_POLL_INTERVAL);
    }
}

/// Last non-empty stderr line, shortened.
fn read_diagnostic(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    let line = text.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    if line.chars().count() > MAX_DIAGNOSTIC_LEN {
        let cut: String = line.chars().take(MAX_DIAGNOSTIC_LEN).collect();
        Some(format!("{}...", cut))
    } else {
        Some(line.to_string())
    }
}

impl Backend for ExternalBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn check_available(&self) -> Result<()> {
        if self.executable.is_file() {
            Ok(())
        } else {
            Err(BenchError::BackendUnavailable {
                name: self.descriptor.name.clone(),
                reason: format!("executable not found at {}", self.executable.display()),
            })
        }
    }

    fn measure(&self, file: &InputFile) -> Measurement {
        let outcome = self.run(file);
        if let Err(e) = &outcome {
            log::debug!("{} failed on {}: {}", self.name(), file.name, e);
        }
        Measurement::from_outcome(self.name(), Origin::External, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_override() {
        let mut descriptor = BackendDescriptor::external("ULC-C", "ulc-c/ulc", "ulc");
        if let BackendKind::External { timeout, .. } = &mut descriptor.kind {
            *timeout = Some(Duration::from_secs(5));
        }
        let backend = ExternalBackend::new(descriptor, &BenchConfig::default());
        assert_eq!(backend.timeout(), Duration::from_secs(5));

        let backend = ExternalBackend::new(
            BackendDescriptor::external("ULC-C", "ulc-c/ulc", "ulc"),
            &BenchConfig::default().with_timeout(Duration::from_secs(9)),
        );
        assert_eq!(backend.timeout(), Duration::from_secs(9));
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let backend = ExternalBackend::new(
            BackendDescriptor::external("ULC-C", "definitely-missing-ulc", "ulc"),
            &BenchConfig::default().with_tools_dir("/nonexistent"),
        );
        let err = backend.check_available().unwrap_err();
        assert!(matches!(err, BenchError::BackendUnavailable { .. }));
        assert!(err.to_string().contains("executable not found"));
    }

    #[test]
    fn test_read_diagnostic_takes_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("err");
        fs::write(&path, "warming up\nerror: bad magic\n\n").unwrap();
        assert_eq!(read_diagnostic(&path).as_deref(), Some("error: bad magic"));

        fs::write(&path, "").unwrap();
        assert_eq!(read_diagnostic(&path), None);
    }

    #[test]
    fn test_read_diagnostic_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("err");
        fs::write(&path, "x".repeat(1000)).unwrap();
        let diagnostic = read_diagnostic(&path).unwrap();
        assert!(diagnostic.ends_with("..."));
        assert_eq!(diagnostic.len(), MAX_DIAGNOSTIC_LEN + 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_with_timeout_kills_child() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let start = Instant::now();
        let err = wait_with_timeout(&mut child, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, BenchError::TimeoutExceeded { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_wait_with_timeout_returns_status() {
        let mut child = Command::new("sh").arg("-c").arg("exit 3").spawn().unwrap();
        let status = wait_with_timeout(&mut child, Duration::from_secs(5)).unwrap();
        assert_eq!(status.code(), Some(3));
    }
}

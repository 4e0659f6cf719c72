//! In-process codec adapter.
//!
//! The input is read fully into memory before the timer starts; only the
//! encoder call is timed. Output goes to an in-memory sink, so nothing is
//! left on disk.

use std::fs;
use std::io::{self, Read, Write};
use std::time::Instant;

use crate::backend::{compare_round_trip, Backend, BackendDescriptor, BackendKind, Codec};
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::model::{InputFile, Measurement, Origin, Sample};

/// liblzma's `LZMA_PRESET_EXTREME` flag.
const LZMA_PRESET_EXTREME: u32 = 1 << 31;

/// Compress `data` with `codec` at `level`.
pub fn compress_bytes(codec: Codec, level: u32, extreme: bool, data: &[u8]) -> io::Result<Vec<u8>> {
    match codec {
        Codec::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level));
            encoder.write_all(data)?;
            encoder.finish()
        }
        Codec::Bzip2 => {
            let mut encoder =
                bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::new(level));
            encoder.write_all(data)?;
            encoder.finish()
        }
        Codec::Xz => {
            let preset = if extreme { level | LZMA_PRESET_EXTREME } else { level };
            let stream = xz2::stream::Stream::new_easy_encoder(preset, xz2::stream::Check::Crc64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            let mut encoder = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

/// Decompress `data` produced by [`compress_bytes`].
pub fn decompress_bytes(codec: Codec, data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    match codec {
        Codec::Gzip => flate2::read::GzDecoder::new(data).read_to_end(&mut out)?,
        Codec::Bzip2 => bzip2::read::BzDecoder::new(data).read_to_end(&mut out)?,
        Codec::Xz => xz2::read::XzDecoder::new(data).read_to_end(&mut out)?,
    };
    Ok(out)
}

/// Backend that calls a standard codec in-process.
#[derive(Debug, Clone)]
pub struct CodecBackend {
    descriptor: BackendDescriptor,
    codec: Codec,
    level: u32,
    extreme: bool,
    verify: bool,
}

impl CodecBackend {
    /// Create the adapter.
    ///
    /// # Panics
    ///
    /// Panics if `descriptor` is not a codec descriptor.
    pub fn new(descriptor: BackendDescriptor, config: &BenchConfig) -> Self {
        let (codec, level, extreme) = match descriptor.kind {
            BackendKind::Codec {
                codec,
                level,
                extreme,
            } => (codec, level, extreme),
            _ => panic!("CodecBackend requires a codec descriptor, got {:?}", descriptor.kind),
        };
        Self {
            descriptor,
            codec,
            level,
            extreme,
            verify: config.verify_round_trip,
        }
    }

    fn run(&self, file: &InputFile) -> Result<Sample> {
        let data = fs::read(&file.path)?;

        let start = Instant::now();
        let compressed = compress_bytes(self.codec, self.level, self.extreme, &data)
            .map_err(|e| BenchError::invocation(format!("{} compression: {}", self.codec, e)))?;
        let mut sample = Sample::timed(compressed.len() as u64, start.elapsed());

        if self.verify {
            let start = Instant::now();
            let restored = decompress_bytes(self.codec, &compressed).map_err(|e| {
                BenchError::invocation(format!("{} decompression: {}", self.codec, e))
            })?;
            sample.decompress_elapsed = Some(start.elapsed());
            compare_round_trip(&data, &restored)?;
        }

        Ok(sample)
    }
}

impl Backend for CodecBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn check_available(&self) -> Result<()> {
        self.codec
            .validate_level(self.level)
            .map_err(|e| BenchError::BackendUnavailable {
                name: self.name().to_string(),
                reason: e.to_string(),
            })
    }

    fn measure(&self, file: &InputFile) -> Measurement {
        let outcome = self.check_available().and_then(|()| self.run(file));
        if let Err(e) = &outcome {
            log::debug!("{} failed on {}: {}", self.name(), file.name, e);
        }
        Measurement::from_outcome(self.name(), Origin::Codec, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn sample_log() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..500 {
            writeln!(
                data,
                "2024-01-15 10:{:02}:{:02} INFO [web] GET /api/items/{} 200 {}ms",
                i / 60 % 60,
                i % 60,
                i % 17,
                i % 250
            )
            .unwrap();
        }
        data
    }

    fn write_input(data: &[u8]) -> (tempfile::NamedTempFile, InputFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        let input = InputFile::discover(file.path()).unwrap();
        (file, input)
    }

    #[test]
    fn test_codecs_round_trip_bytes() {
        let data = sample_log();
        for codec in [Codec::Gzip, Codec::Bzip2, Codec::Xz] {
            let compressed = compress_bytes(codec, 9, false, &data).unwrap();
            assert!(compressed.len() < data.len(), "{} did not compress", codec);
            assert_eq!(decompress_bytes(codec, &compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_xz_extreme_preset() {
        let data = sample_log();
        let compressed = compress_bytes(Codec::Xz, 9, true, &data).unwrap();
        assert_eq!(decompress_bytes(Codec::Xz, &compressed).unwrap(), data);
    }

    #[test]
    fn test_measure_success() {
        let (_guard, input) = write_input(&sample_log());
        let backend = CodecBackend::new(
            BackendDescriptor::codec("Gzip", Codec::Gzip, 9),
            &BenchConfig::default(),
        );

        let m = backend.measure(&input);
        assert!(m.is_success());
        assert_eq!(m.backend, "Gzip");
        assert_eq!(m.origin, Origin::Codec);
        assert!(m.compressed_size > 0);
        assert!(m.compressed_size < input.original_size);
        assert!(m.elapsed_secs.is_some());
        assert!(m.decompress_secs.is_none());
    }

    #[test]
    fn test_measure_with_round_trip() {
        let (_guard, input) = write_input(&sample_log());
        let backend = CodecBackend::new(
            BackendDescriptor::codec("Bzip2", Codec::Bzip2, 9),
            &BenchConfig::default().with_verify_round_trip(true),
        );

        let m = backend.measure(&input);
        assert!(m.is_success());
        assert!(m.decompress_secs.is_some());
    }

    #[test]
    fn test_measure_is_deterministic() {
        let (_guard, input) = write_input(&sample_log());
        let backend = CodecBackend::new(
            BackendDescriptor::codec("LZMA", Codec::Xz, 6),
            &BenchConfig::default(),
        );

        let first = backend.measure(&input);
        let second = backend.measure(&input);
        assert_eq!(first.compressed_size, second.compressed_size);
    }

    #[test]
    fn test_measure_unreadable_input_is_failure() {
        let backend = CodecBackend::new(
            BackendDescriptor::codec("Gzip", Codec::Gzip, 9),
            &BenchConfig::default(),
        );
        let input = InputFile {
            name: "vanished.log".to_string(),
            path: PathBuf::from("/nonexistent/vanished.log"),
            original_size: 10,
        };

        let m = backend.measure(&input);
        assert!(!m.is_success());
        assert_eq!(m.compressed_size, 0);
        assert!(m.failure_reason().unwrap().contains("IO error"));
    }

    #[test]
    #[should_panic(expected = "requires a codec descriptor")]
    fn test_new_rejects_external_descriptor() {
        CodecBackend::new(
            BackendDescriptor::external("ULC-C", "ulc", "ulc"),
            &BenchConfig::default(),
        );
    }
}

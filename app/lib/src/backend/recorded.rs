//! Recorded baseline adapter: historical sizes instead of a live run.

use std::collections::BTreeMap;

use crate::backend::{Backend, BackendDescriptor, BackendKind};
use crate::config::BaselineTable;
use crate::error::BenchError;
use crate::model::{InputFile, Measurement, Origin, Sample};

/// Backend that reports sizes from a static table.
///
/// It only applies to files the table knows about and carries no timing.
#[derive(Debug, Clone)]
pub struct RecordedBackend {
    descriptor: BackendDescriptor,
    sizes: BTreeMap<String, u64>,
}

impl RecordedBackend {
    /// Create a recorded backend from explicit sizes keyed by file name.
    pub fn new(name: impl Into<String>, sizes: BTreeMap<String, u64>) -> Self {
        Self {
            descriptor: BackendDescriptor::new(name, BackendKind::Recorded),
            sizes,
        }
    }

    /// Create a recorded backend from the entries `table` holds for `name`.
    pub fn from_table(name: &str, table: &BaselineTable) -> Self {
        Self::new(name, table.sizes_for(name))
    }
}

impl Backend for RecordedBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn check_available(&self) -> crate::Result<()> {
        if self.sizes.is_empty() {
            return Err(BenchError::BackendUnavailable {
                name: self.descriptor.name.clone(),
                reason: "no recorded sizes".to_string(),
            });
        }
        Ok(())
    }

    fn applies_to(&self, file: &InputFile) -> bool {
        self.sizes.contains_key(&file.name)
    }

    fn measure(&self, file: &InputFile) -> Measurement {
        let outcome = self
            .sizes
            .get(&file.name)
            .map(|&size| Sample {
                compressed_size: size,
                elapsed: None,
                decompress_elapsed: None,
            })
            .ok_or_else(|| BenchError::malformed(format!("no recorded size for {}", file.name)));
        Measurement::from_outcome(self.name(), Origin::Recorded, outcome)
    }
}

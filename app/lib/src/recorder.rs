//! Metrics recorder.
//!
//! Collects one [`Measurement`] per (file, backend) pair for the lifetime of
//! a single run. Each pair owns its own slot in a [`DashMap`], so concurrent
//! workers can record without losing updates. Recording the same pair twice
//! is a contract violation and panics.

use std::collections::HashMap;
use std::path::PathBuf;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::backend::BackendDescriptor;
use crate::model::{FileResultSet, InputFile, Measurement};

/// Run-scoped result builder.
#[derive(Debug)]
pub struct ResultRecorder {
    files: Vec<InputFile>,
    file_index: HashMap<PathBuf, usize>,
    backend_index: HashMap<String, usize>,
    backend_count: usize,
    slots: DashMap<(usize, usize), Measurement>,
}

impl ResultRecorder {
    /// Create a recorder for the given files and backends.
    ///
    /// Registration order of `backends` becomes the measurement order of
    /// every result set.
    pub fn new(files: Vec<InputFile>, backends: &[BackendDescriptor]) -> Self {
        let file_index = files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.path.clone(), i))
            .collect();
        let backend_index = backends
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
        Self {
            files,
            file_index,
            backend_index,
            backend_count: backends.len(),
            slots: DashMap::new(),
        }
    }

    /// Record the measurement for `(file, backend)`.
    ///
    /// # Panics
    ///
    /// Panics if the pair was already recorded, if either side was not
    /// registered, or if the measurement names a different backend.
    pub fn record(&self, file: &InputFile, backend: &BackendDescriptor, measurement: Measurement) {
        assert_eq!(
            measurement.backend, backend.name,
            "measurement recorded under the wrong backend"
        );
        let file_slot = *self
            .file_index
            .get(&file.path)
            .unwrap_or_else(|| panic!("unregistered input file {}", file.path.display()));
        let backend_slot = *self
            .backend_index
            .get(&backend.name)
            .unwrap_or_else(|| panic!("unregistered backend {}", backend.name));

        let duplicate = match self.slots.entry((file_slot, backend_slot)) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(measurement);
                false
            }
        };
        if duplicate {
            panic!(
                "duplicate measurement for ({}, {})",
                file.name, backend.name
            );
        }
    }

    /// Number of measurements recorded so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consume the recorder, producing one result set per registered file
    /// with measurements in backend registration order.
    pub fn finish(self) -> Vec<FileResultSet> {
        let slots = self.slots;
        let backend_count = self.backend_count;
        self.files
            .into_iter()
            .enumerate()
            .map(|(file_slot, file)| {
                let mut set = FileResultSet::new(file);
                for backend_slot in 0..backend_count {
                    if let Some((_, m)) = slots.remove(&(file_slot, backend_slot)) {
                        set.measurements.push(m);
                    }
                }
                set
            })
            .collect()
    }
}

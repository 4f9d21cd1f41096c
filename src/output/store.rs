//! Append-only record store shared by all fetch tasks

use crate::output::jsonl::write_jsonl_file;
use crate::output::record::ProductRecord;
use crate::output::OutputResult;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory collection of every record extracted during a run
///
/// Cloning yields another handle to the same store. Records are kept in the
/// order their pages finished; the records of one page stay contiguous.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<Mutex<Vec<ProductRecord>>>,
}

impl RecordStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProductRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends one page worth of records
    ///
    /// # Returns
    ///
    /// The number of records appended
    pub fn append(&self, records: Vec<ProductRecord>) -> usize {
        let count = records.len();
        if count > 0 {
            self.lock().extend(records);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies the records collected so far
    pub fn snapshot(&self) -> Vec<ProductRecord> {
        self.lock().clone()
    }

    /// Writes every record to `path` as JSON Lines, replacing the file
    ///
    /// # Returns
    ///
    /// The number of records written
    pub fn flush_all(&self, path: &Path) -> OutputResult<usize> {
        let records = self.lock();
        let written = write_jsonl_file(path, &records)?;
        tracing::info!("Wrote {} records to {}", written, path.display());
        Ok(written)
    }
}

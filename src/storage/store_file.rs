//! Store File handle
//!
//! A store file on disk together with its shared, reference-counted reader.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;

use super::sstable::StoreFileReader;

/// One immutable store file known to the storage layer
#[derive(Clone)]
pub struct StoreFile {
    id: u64,
    reader: Arc<StoreFileReader>,
}

impl StoreFile {
    /// Open the file and its shared reader
    pub fn open(path: &Path, id: u64, config: &Config) -> Result<Self> {
        let reader = StoreFileReader::open(path, config)?;
        Ok(Self {
            id,
            reader: Arc::new(reader),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// The shared reader every scanner over this file is built on
    pub fn reader(&self) -> &Arc<StoreFileReader> {
        &self.reader
    }

    pub fn sequence_id(&self) -> u64 {
        self.reader.sequence_id()
    }

    pub fn is_bulk_loaded(&self) -> bool {
        self.reader.is_bulk_loaded()
    }

    pub fn file_size(&self) -> u64 {
        self.reader.file_size()
    }

    /// Bulk-loaded files carry their load time; flushed files sort after them
    fn bulk_load_time(&self) -> u64 {
        if self.is_bulk_loaded() {
            self.reader.info().created_at_ms
        } else {
            u64::MAX
        }
    }

    /// Oldest-first file order: sequence id, bulk load time, then path
    pub fn compare_by_sequence_id(a: &StoreFile, b: &StoreFile) -> Ordering {
        a.sequence_id()
            .cmp(&b.sequence_id())
            .then_with(|| a.bulk_load_time().cmp(&b.bulk_load_time()))
            .then_with(|| a.path().cmp(b.path()))
    }
}

impl std::fmt::Debug for StoreFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFile")
            .field("id", &self.id)
            .field("path", &self.path())
            .field("sequence_id", &self.sequence_id())
            .field("bulk_loaded", &self.is_bulk_loaded())
            .finish()
    }
}

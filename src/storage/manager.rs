//! Storage Manager
//!
//! Manages the store files of one directory and hands out scanners over them.
//!
//! ## Responsibilities
//! - Discover existing store files on startup
//! - Write new store files (flushed or bulk loaded)
//! - Evict store files
//! - Build record scanners over the current file set

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::query::ScanQueryMatcher;
use crate::record::Record;
use crate::scanner::{build_scanners, RecordScanner, ScanOptions};

use super::sstable::{BuildOptions, SSTableBuilder, StoreFileMeta};
use super::StoreFile;

/// Manages the storage layer
///
/// ## Concurrency:
/// - `files`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `next_file_id`: Atomic counter (lock-free)
/// - All methods use `&self` (no exclusive access needed)
pub struct StorageManager {
    config: Config,

    /// Open store files, ordered newest id → oldest id
    files: RwLock<Vec<StoreFile>>,

    /// Next ID for creating new store files (atomic, lock-free)
    next_file_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the configured directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing store files
    /// 3. Open readers for each (loads indexes into RAM)
    /// 4. Order by ID descending (newest first)
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let path = config.data_dir.clone();
        fs::create_dir_all(&path)?;

        let mut file_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(&path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_file_id(&file_path) {
                    file_ids.push(id);
                }
            }
        }

        // Newest first (highest ID first)
        file_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut files = Vec::with_capacity(file_ids.len());
        for id in &file_ids {
            files.push(StoreFile::open(&Self::file_path_with_dir(&path, *id), *id, &config)?);
        }

        let next_id = file_ids.first().map(|&id| id + 1).unwrap_or(1);

        tracing::info!(
            "Storage opened at {} with {} store files",
            path.display(),
            files.len()
        );

        Ok(Self {
            config,
            files: RwLock::new(files),
            next_file_id: AtomicU64::new(next_id),
        })
    }

    /// Write sorted records to a new store file
    ///
    /// The file's sequence id is the largest record sequence.
    pub fn write_file<I>(&self, records: I) -> Result<StoreFileMeta>
    where
        I: IntoIterator<Item = Record>,
    {
        self.write_with(records, BuildOptions::from_config(&self.config))
    }

    /// Write sorted records as a bulk-loaded store file
    ///
    /// Every record of the file becomes visible at `sequence_id`.
    pub fn bulk_load<I>(&self, records: I, sequence_id: u64) -> Result<StoreFileMeta>
    where
        I: IntoIterator<Item = Record>,
    {
        self.write_with(
            records,
            BuildOptions::from_config(&self.config).bulk_load(sequence_id),
        )
    }

    fn write_with<I>(&self, records: I, options: BuildOptions) -> Result<StoreFileMeta>
    where
        I: IntoIterator<Item = Record>,
    {
        let id = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        let path = self.file_path(id);

        match self.build_file(id, &path, records, options) {
            Ok((meta, file)) => {
                self.files.write().insert(0, file);
                Ok(meta)
            }
            Err(e) => {
                // No partial file may survive a failed write
                if let Err(rm) = fs::remove_file(&path) {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            "Could not remove partial store file {}: {}",
                            path.display(),
                            rm
                        );
                    }
                }
                Err(e)
            }
        }
    }

    fn build_file<I>(
        &self,
        id: u64,
        path: &Path,
        records: I,
        options: BuildOptions,
    ) -> Result<(StoreFileMeta, StoreFile)>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut builder = SSTableBuilder::new(path, options)?;
        for record in records {
            builder.add(&record)?;
        }
        let meta = builder.finish()?;
        if meta.info.entry_count == 0 {
            return Err(StrataError::Storage(
                "Cannot write an empty store file".to_string(),
            ));
        }
        let file = StoreFile::open(path, id, &self.config)?;
        Ok((meta, file))
    }

    /// Evict a store file from the set and delete it from disk
    ///
    /// Scanners already open keep working on their handles where the OS
    /// allows it; new private streams will report the file as missing.
    pub fn remove_file(&self, id: u64) -> Result<()> {
        let removed = {
            let mut files = self.files.write();
            let pos = files.iter().position(|f| f.id() == id).ok_or_else(|| {
                StrataError::Storage(format!("No store file with id {}", id))
            })?;
            files.remove(pos)
        };
        if let Err(e) = fs::remove_file(removed.path()) {
            // Still on disk, so keep it in the set
            let mut files = self.files.write();
            let pos = files.iter().position(|f| f.id() < id).unwrap_or(files.len());
            files.insert(pos, removed);
            return Err(e.into());
        }
        tracing::debug!(
            "Removed store file {} ({} open scanners)",
            removed.path().display(),
            removed.reader().ref_count()
        );
        Ok(())
    }

    /// Build scanners over every current store file, newest first
    pub fn scanners(
        &self,
        options: ScanOptions,
        matcher: Option<Arc<ScanQueryMatcher>>,
        read_point: u64,
    ) -> Vec<RecordScanner> {
        let files = self.files.read();
        build_scanners(&files, options, matcher, read_point)
    }

    /// Snapshot of the current file set, newest id first
    pub fn files(&self) -> Vec<StoreFile> {
        self.files.read().clone()
    }

    /// Get the number of store files
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// Total bytes of all store files
    pub fn total_size(&self) -> u64 {
        self.files.read().iter().map(|f| f.file_size()).sum()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the next store file ID (for testing/debugging)
    pub fn next_file_id(&self) -> u64 {
        self.next_file_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn file_path(&self, id: u64) -> PathBuf {
        Self::file_path_with_dir(&self.config.data_dir, id)
    }

    fn file_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("storefile_{:06}.sst", id))
    }

    /// "storefile_000042.sst" → Some(42)
    fn parse_file_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("storefile_")?;
        id_str.parse().ok()
    }
}

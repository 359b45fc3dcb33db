//! Storage Module
//!
//! Immutable store files and the manager that owns them.
//!
//! ## Responsibilities
//! - Persist sorted, versioned records to disk
//! - Expose per-file metadata (time range, row range, sequence id, blooms)
//! - Provide seekable cursors for record scanners
//! - Track reader lifetimes through reference counts

pub mod sstable;
mod manager;
mod store_file;

pub use manager::StorageManager;
pub use sstable::{
    BuildOptions, CursorOptions, FileCursor, FileInfo, SSTableBuilder, SSTableCursor, SeekResult,
    StoreFileMeta, StoreFileReader,
};
pub use store_file::StoreFile;

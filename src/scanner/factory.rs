//! Scanner factory: one scanner per store file, ranked by file age.

use std::sync::Arc;

use crate::query::ScanQueryMatcher;
use crate::storage::{CursorOptions, StoreFile};

use super::RecordScanner;

/// Read options shared by every scanner of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Memoize decoded entries on the shared reader
    pub cache_blocks: bool,
    /// Positional reads on the shared handle instead of private streams
    pub use_pread: bool,
    /// Compaction reads see every version and never populate the cache
    pub compaction: bool,
    pub primary_replica: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            cache_blocks: true,
            use_pread: true,
            compaction: false,
            primary_replica: true,
        }
    }
}

impl ScanOptions {
    /// Options for a compaction pass: streaming reads, no caching, no MVCC
    pub fn for_compaction() -> Self {
        Self {
            cache_blocks: false,
            use_pread: false,
            compaction: true,
            primary_replica: true,
        }
    }

    pub fn cache_blocks(mut self, cache_blocks: bool) -> Self {
        self.cache_blocks = cache_blocks;
        self
    }

    pub fn use_pread(mut self, use_pread: bool) -> Self {
        self.use_pread = use_pread;
        self
    }

    pub fn primary_replica(mut self, primary_replica: bool) -> Self {
        self.primary_replica = primary_replica;
        self
    }

    pub fn cursor_options(&self) -> CursorOptions {
        CursorOptions {
            cache_blocks: self.cache_blocks,
            use_pread: self.use_pread,
            compaction: self.compaction,
        }
    }
}

/// Build one scanner per file, newest file first
///
/// Files are ranked oldest to newest by [`StoreFile::compare_by_sequence_id`]
/// and that rank becomes the scanner order, so the newest file wins ties in
/// a merge.
pub fn build_scanners(
    files: &[StoreFile],
    options: ScanOptions,
    matcher: Option<Arc<ScanQueryMatcher>>,
    read_point: u64,
) -> Vec<RecordScanner> {
    let mut sorted: Vec<&StoreFile> = files.iter().collect();
    sorted.sort_by(|a, b| StoreFile::compare_by_sequence_id(a, b));

    let cursor_options = options.cursor_options();
    let mut scanners: Vec<RecordScanner> = sorted
        .iter()
        .enumerate()
        .map(|(order, file)| {
            let reader = file.reader();
            reader.set_primary_replica(options.primary_replica);
            let mut scanner =
                RecordScanner::open(reader, cursor_options, read_point, order as u64);
            scanner.set_matcher(matcher.clone());
            scanner
        })
        .collect();
    scanners.reverse();

    tracing::debug!(
        "Built {} scanners at read point {} (compaction: {})",
        scanners.len(),
        read_point,
        options.compaction
    );
    scanners
}

//! Scanner Module
//!
//! Record scanners over store files, the factory that builds them for a
//! query, and the ordering rule a merge layer uses to combine them.
//!
//! # Architecture
//!
//! ```text
//! query / merge layer
//!     │   compare_scanners (tie-break on scanner_order)
//!     ▼
//! [RecordScanner, RecordScanner, ...]   (newest file first)
//!     │   visibility filter (sequence <= read_point), lazy seeks, blooms
//!     ▼
//! SSTableCursor ──► StoreFileReader (shared, ref-counted)
//! ```
//!
//! # Lifecycle
//!
//! A scanner starts unpositioned. Call one of the seek methods to position
//! it, then `peek`/`next`:
//!
//! ```ignore
//! scanner.seek(&Record::first_on_row("row-1"))?;
//! while let Some(record) = scanner.next()? {
//!     println!("{}", record);
//! }
//! scanner.close();
//! ```

mod factory;
mod ordering;
mod record_scanner;

pub use factory::{build_scanners, ScanOptions};
pub use ordering::compare_scanners;
pub use record_scanner::RecordScanner;

use crate::error::Result;
use crate::query::Scan;
use crate::record::Record;

/// A seekable, peekable source of records in record order
///
/// Implemented by [`RecordScanner`]; a merge layer holds scanners through
/// this trait.
pub trait KeyValueScanner {
    /// Record under the cursor, without advancing
    fn peek(&self) -> Option<&Record>;

    /// Return the current record and advance past it
    fn next(&mut self) -> Result<Option<Record>>;

    /// Position at the first visible record >= `key`
    ///
    /// Returns false (and clears the current record) if there is none.
    fn seek(&mut self, key: &Record) -> Result<bool>;

    /// Like `seek`, for a `key` at or after the current position
    fn reseek(&mut self, key: &Record) -> Result<bool>;

    /// Seek lazily: defer or skip the real seek when a bloom filter or the
    /// file's max timestamp allows it
    fn request_seek(&mut self, key: &Record, forward: bool, use_bloom: bool) -> Result<bool>;

    /// False while a lazy seek is pending
    fn real_seek_done(&self) -> bool;

    /// Perform the pending lazy seek, if any
    fn enforce_seek(&mut self) -> Result<()>;

    /// Position at the first visible record of the row before `key`'s row
    fn seek_to_previous_row(&mut self, key: &Record) -> Result<bool>;

    /// Position at the first visible record of the last row with one
    fn seek_to_last_row(&mut self) -> Result<bool>;

    /// Seek to `key`, falling back to the previous row when the seek lands
    /// on a later row
    fn backward_seek(&mut self, key: &Record) -> Result<bool>;

    /// Cheap check whether the file can contribute to `scan` at all
    fn should_use_scanner(&self, scan: &Scan, family: &[u8], oldest_unexpired_ts: u64) -> bool;

    /// Tie-break rank; higher means newer data
    fn scanner_order(&self) -> u64;

    fn is_file_scanner(&self) -> bool {
        false
    }

    /// Release resources; idempotent
    fn close(&mut self);
}

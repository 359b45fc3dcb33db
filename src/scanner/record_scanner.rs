//! Record Scanner
//!
//! Iterator over one store file that hides versions newer than its read
//! point and supports lazy, bloom-gated seeks.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, ScanOp, StrataError};
use crate::filter::BloomType;
use crate::query::{Scan, ScanQueryMatcher};
use crate::record::{compare_rows, Record};
use crate::storage::{CursorOptions, FileCursor, SeekResult, StoreFileReader};

use super::KeyValueScanner;

/// A seek deferred by `request_seek`
#[derive(Debug, Clone)]
struct PendingSeek {
    forward: bool,
    key: Record,
}

/// Scanner over a single store file
///
/// ## Visibility
/// When enforcement is on, records with `sequence > read_point` are never
/// surfaced by a real seek or by `next`. Enforcement is on for non-compaction
/// scans of files that carry sequence numbers or were bulk loaded.
///
/// ## Ownership
/// Owned and driven by one query at a time. Holds one reference on the
/// reader, released exactly once by `close` (or on drop).
pub struct RecordScanner {
    reader: Arc<StoreFileReader>,
    cursor: Box<dyn FileCursor>,
    current: Option<Record>,
    closed: bool,

    real_seek_done: bool,
    pending_seek: Option<PendingSeek>,

    enforce_visibility: bool,
    read_point: u64,
    /// Bounds the visibility skip to the current row (previous-row seeks only)
    stop_at_next_row: bool,

    scanner_order: u64,
    matcher: Option<Arc<ScanQueryMatcher>>,
    seek_count: u64,
}

/// Position `cursor` at the first entry >= `key`
fn seek_at_or_after(cursor: &mut dyn FileCursor, key: &Record) -> Result<bool> {
    match cursor.seek_to(key)? {
        SeekResult::BeforeFirst => cursor.seek_to_first(),
        SeekResult::AtOrAfter => Ok(true),
        SeekResult::Before => cursor.next(),
    }
}

/// Forward-only variant of [`seek_at_or_after`]
fn reseek_at_or_after(cursor: &mut dyn FileCursor, key: &Record) -> Result<bool> {
    match cursor.reseek_to(key)? {
        SeekResult::BeforeFirst => {
            // First positioning of this cursor: start of file
            if !cursor.is_seeked() {
                cursor.seek_to_first()
            } else {
                Ok(true)
            }
        }
        SeekResult::AtOrAfter => Ok(true),
        SeekResult::Before => cursor.next(),
    }
}

impl RecordScanner {
    /// Scanner over `reader` using `cursor`
    ///
    /// `use_mvcc` is false for compaction reads, which must see every version.
    pub fn new(
        reader: Arc<StoreFileReader>,
        cursor: Box<dyn FileCursor>,
        use_mvcc: bool,
        read_point: u64,
        scanner_order: u64,
    ) -> Self {
        reader.increment_ref_count();
        let enforce_visibility =
            use_mvcc && (reader.has_mvcc_info() || reader.is_bulk_loaded());
        Self {
            reader,
            cursor,
            current: None,
            closed: false,
            real_seek_done: false,
            pending_seek: None,
            enforce_visibility,
            read_point,
            stop_at_next_row: false,
            scanner_order,
            matcher: None,
            seek_count: 0,
        }
    }

    /// Scanner with a fresh cursor over `reader`
    pub fn open(
        reader: &Arc<StoreFileReader>,
        options: CursorOptions,
        read_point: u64,
        scanner_order: u64,
    ) -> Self {
        let cursor = Box::new(reader.cursor(options));
        Self::new(
            Arc::clone(reader),
            cursor,
            !options.compaction,
            read_point,
            scanner_order,
        )
    }

    pub fn set_matcher(&mut self, matcher: Option<Arc<ScanQueryMatcher>>) {
        self.matcher = matcher;
    }

    pub fn reader(&self) -> &Arc<StoreFileReader> {
        &self.reader
    }

    pub fn read_point(&self) -> u64 {
        self.read_point
    }

    pub fn enforces_visibility(&self) -> bool {
        self.enforce_visibility
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_primary_replica(&self) -> bool {
        self.reader.is_primary_replica()
    }

    /// Real seeks issued against the underlying cursor
    pub fn seek_count(&self) -> u64 {
        self.seek_count
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StrataError::InvalidArgument(format!(
                "{} is closed",
                self
            )));
        }
        Ok(())
    }

    /// Install `record` as current, rewriting bulk-loaded sequences
    fn set_current(&mut self, record: Option<Record>) {
        let rewrite = self.reader.is_bulk_loaded() && !self.reader.is_skip_reset_seq_id();
        let sequence_id = self.reader.sequence_id();
        self.current = record.map(|mut r| {
            if rewrite {
                r.sequence = sequence_id;
            }
            r
        });
    }

    fn load_current(&mut self) {
        let record = self.cursor.current().cloned();
        self.set_current(record);
    }

    /// Skip records newer than the read point
    ///
    /// Returns false when the file is exhausted or, with `stop_at_next_row`,
    /// when skipping would leave the starting row.
    fn skip_invisible(&mut self) -> Result<bool> {
        let start_row = match &self.current {
            Some(current) => current.row.clone(),
            None => return Ok(false),
        };

        while self.enforce_visibility {
            match &self.current {
                Some(current) if current.sequence > self.read_point => {}
                _ => break,
            }
            self.cursor.next()?;
            self.load_current();

            if self.stop_at_next_row {
                if let Some(current) = &self.current {
                    if compare_rows(&current.row, &start_row) == Ordering::Greater {
                        return Ok(false);
                    }
                }
            }
        }

        Ok(self.current.is_some())
    }

    fn advance(&mut self) -> Result<()> {
        self.cursor.next()?;
        self.load_current();
        self.skip_invisible()?;
        Ok(())
    }

    fn position_at_or_after(&mut self, key: &Record, forward_only: bool) -> Result<bool> {
        let found = if forward_only {
            reseek_at_or_after(self.cursor.as_mut(), key)?
        } else {
            seek_at_or_after(self.cursor.as_mut(), key)?
        };
        if !found {
            self.current = None;
            return Ok(false);
        }
        self.load_current();
        self.skip_invisible()
    }

    fn previous_row(&mut self, original: &Record) -> Result<bool> {
        let mut key_row = original.row.clone();
        loop {
            let seek_key = Record::first_on_row(key_row.clone());
            self.seek_count += 1;
            if !self.cursor.seek_before(&seek_key)? {
                self.current = None;
                return Ok(false);
            }

            let landed_row = match self.cursor.current() {
                Some(landed) => landed.row.clone(),
                None => {
                    self.current = None;
                    return Ok(false);
                }
            };
            debug_assert!(compare_rows(&landed_row, &key_row) == Ordering::Less);
            let first_of_previous = Record::first_on_row(landed_row.clone());

            self.seek_count += 1;
            if !seek_at_or_after(self.cursor.as_mut(), &first_of_previous)? {
                self.current = None;
                return Ok(false);
            }
            self.load_current();

            self.stop_at_next_row = true;
            let satisfied = self.skip_invisible();
            self.stop_at_next_row = false;

            let left_row = match &self.current {
                Some(current) => compare_rows(&current.row, &landed_row) == Ordering::Greater,
                None => true,
            };
            if !satisfied? || left_row {
                // Nothing visible in that row; retry from it
                key_row = landed_row;
                continue;
            }
            return Ok(true);
        }
    }

    /// Attach scanner identity and the key to a failure
    fn annotate(&self, op: ScanOp, key: Option<&Record>, err: StrataError) -> StrataError {
        if matches!(err, StrataError::SourceMissing { .. }) {
            return err;
        }
        tracing::warn!("Could not {} {}: {}", op, self, err);
        StrataError::Scan {
            op,
            scanner: self.to_string(),
            key: key.map_or_else(|| "<none>".to_string(), |k| k.to_string()),
            source: Box::new(err),
        }
    }
}

impl KeyValueScanner for RecordScanner {
    fn peek(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    fn next(&mut self) -> Result<Option<Record>> {
        let previous = self.current.take();
        if previous.is_some() {
            if let Err(e) = self.advance() {
                return Err(self.annotate(ScanOp::Iterate, previous.as_ref(), e));
            }
        }
        Ok(previous)
    }

    fn seek(&mut self, key: &Record) -> Result<bool> {
        self.ensure_open()?;
        self.seek_count += 1;
        let result = self.position_at_or_after(key, false);
        self.real_seek_done = true;
        result.map_err(|e| self.annotate(ScanOp::Seek, Some(key), e))
    }

    fn reseek(&mut self, key: &Record) -> Result<bool> {
        self.ensure_open()?;
        self.seek_count += 1;
        let result = self.position_at_or_after(key, true);
        self.real_seek_done = true;
        result.map_err(|e| self.annotate(ScanOp::Reseek, Some(key), e))
    }

    fn request_seek(&mut self, key: &Record, forward: bool, use_bloom: bool) -> Result<bool> {
        self.ensure_open()?;
        let use_bloom = use_bloom && !key.family.is_empty();

        let mut have_to_seek = true;
        if use_bloom {
            if self.reader.bloom_type() == BloomType::RowCol {
                have_to_seek = self.reader.passes_row_col_bloom_filter(key);
            } else if key.record_type.is_delete_family() {
                let null_column = self
                    .matcher
                    .as_ref()
                    .map(|m| m.has_null_column_in_query());
                if null_column == Some(false) {
                    have_to_seek = self.reader.passes_delete_family_bloom_filter(&key.row);
                }
            }
        }

        self.pending_seek = Some(PendingSeek {
            forward,
            key: key.clone(),
        });

        if have_to_seek {
            self.real_seek_done = false;
            let max_timestamp = self.reader.max_timestamp();
            if key.timestamp > max_timestamp {
                // Nothing in this file is newer than max_timestamp; a fake key
                // at that timestamp is not greater than the real next key
                tracing::trace!(
                    "Deferring seek on {} to {} (max timestamp {})",
                    self.reader.path().display(),
                    key,
                    max_timestamp
                );
                self.set_current(Some(key.first_on_row_col_ts(max_timestamp)));
            } else {
                self.enforce_seek()?;
            }
            return Ok(self.current.is_some());
        }

        // Bloom says the row/column is absent: park after it without seeking
        tracing::trace!(
            "Bloom filter skipped seek on {} to {}",
            self.reader.path().display(),
            key
        );
        self.set_current(Some(key.last_on_row_col()));
        self.real_seek_done = true;
        Ok(true)
    }

    fn real_seek_done(&self) -> bool {
        self.real_seek_done
    }

    fn enforce_seek(&mut self) -> Result<()> {
        if self.real_seek_done {
            return Ok(());
        }
        let Some(pending) = self.pending_seek.take() else {
            return Ok(());
        };
        if pending.forward {
            self.reseek(&pending.key)?;
        } else {
            self.seek(&pending.key)?;
        }
        Ok(())
    }

    fn seek_to_previous_row(&mut self, key: &Record) -> Result<bool> {
        self.ensure_open()?;
        let result = self.previous_row(key);
        self.real_seek_done = true;
        result.map_err(|e| self.annotate(ScanOp::SeekToPreviousRow, Some(key), e))
    }

    fn seek_to_last_row(&mut self) -> Result<bool> {
        let Some(last_row) = self.reader.last_row_key() else {
            return Ok(false);
        };
        let seek_key = Record::first_on_row(Bytes::copy_from_slice(last_row));
        if self.seek(&seek_key)? {
            Ok(true)
        } else {
            self.seek_to_previous_row(&seek_key)
        }
    }

    fn backward_seek(&mut self, key: &Record) -> Result<bool> {
        self.seek(key)?;
        let overshot = match &self.current {
            Some(current) => compare_rows(&current.row, &key.row) == Ordering::Greater,
            None => true,
        };
        if overshot {
            return self.seek_to_previous_row(key);
        }
        Ok(true)
    }

    fn should_use_scanner(&self, scan: &Scan, family: &[u8], oldest_unexpired_ts: u64) -> bool {
        let time_range = scan.time_range_for(family);
        self.reader
            .passes_timerange_filter(&time_range, oldest_unexpired_ts)
            && self.reader.passes_key_range_filter(scan)
            && self.reader.passes_bloom_filter(scan, scan.columns(family))
    }

    fn scanner_order(&self) -> u64 {
        self.scanner_order
    }

    fn is_file_scanner(&self) -> bool {
        true
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.current = None;
        self.cursor.close();
        let remaining = self.reader.decrement_ref_count();
        self.closed = true;
        tracing::trace!(
            "Closed scanner on {} ({} references left)",
            self.reader.path().display(),
            remaining
        );
    }
}

impl Drop for RecordScanner {
    fn drop(&mut self) {
        KeyValueScanner::close(self);
    }
}

impl fmt::Display for RecordScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordScanner[{}, cur=", self.reader.path().display())?;
        match &self.current {
            Some(current) => write!(f, "{}]", current),
            None => f.write_str("null]"),
        }
    }
}

impl fmt::Debug for RecordScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordScanner")
            .field("path", &self.reader.path())
            .field("current", &self.current)
            .field("read_point", &self.read_point)
            .field("scanner_order", &self.scanner_order)
            .field("real_seek_done", &self.real_seek_done)
            .field("closed", &self.closed)
            .finish()
    }
}

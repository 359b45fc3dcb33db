//! Tests for RecordScanner
//!
//! These tests verify:
//! - Read-point visibility on seek, reseek and next
//! - Bulk-loaded sequence rewriting
//! - Lazy seeks (timestamp placeholders, bloom short-circuits)
//! - Previous-row, last-row and backward seeks
//! - Close idempotence and reference counting
//! - Error annotation and missing-file pass-through

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use strata::error::ScanOp;
use strata::filter::BloomType;
use strata::query::{Scan, ScanQueryMatcher, TimeRange};
use strata::record::{compare_keys, Record, RecordType};
use strata::storage::{
    BuildOptions, CursorOptions, FileCursor, SSTableBuilder, SeekResult, StoreFileReader,
};
use strata::{Config, KeyValueScanner, RecordScanner, Result, StrataError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_reader(dir: &TempDir, name: &str, options: BuildOptions, records: &[Record]) -> Arc<StoreFileReader> {
    let path = dir.path().join(name);
    let mut builder = SSTableBuilder::new(&path, options).unwrap();
    for record in records {
        builder.add(record).unwrap();
    }
    builder.finish().unwrap();
    Arc::new(StoreFileReader::open(&path, &Config::default()).unwrap())
}

fn scanner(reader: &Arc<StoreFileReader>, read_point: u64) -> RecordScanner {
    RecordScanner::open(reader, CursorOptions::default(), read_point, 0)
}

fn put(row: &str, ts: u64, seq: u64) -> Record {
    Record::put(row.to_string(), "cf", "q", ts, seq, format!("{}@{}", row, ts))
}

/// (row="a",ts=10,seq=5), (row="a",ts=9,seq=3), (row="b",ts=8,seq=7)
fn scenario_records() -> Vec<Record> {
    vec![put("a", 10, 5), put("a", 9, 3), put("b", 8, 7)]
}

/// Rows 1, 3, 3, 5; the newest version of row 3 has sequence 9
fn previous_row_records() -> Vec<Record> {
    vec![put("1", 1, 1), put("3", 20, 9), put("3", 10, 2), put("5", 1, 3)]
}

fn drain(scanner: &mut RecordScanner) -> Vec<Record> {
    let mut out = Vec::new();
    while let Some(record) = scanner.next().unwrap() {
        out.push(record);
    }
    out
}

fn row(record: Option<&Record>) -> &[u8] {
    &record.unwrap().row
}

/// A column of `row` the file's row+column bloom filter rules out
fn absent_column(reader: &StoreFileReader, row: &str) -> Record {
    (0..1000)
        .map(|i| Record::first_on_row_col(row.to_string(), "cf", format!("absent{}", i)))
        .find(|key| !reader.passes_row_col_bloom_filter(key))
        .unwrap()
}

/// Cursor that positions on one record and fails where told to
struct ScriptedCursor {
    record: Record,
    current: Option<Record>,
    fail_on_seek: bool,
    error: fn() -> StrataError,
}

impl ScriptedCursor {
    fn new(record: Record, fail_on_seek: bool, error: fn() -> StrataError) -> Self {
        Self {
            record,
            current: None,
            fail_on_seek,
            error,
        }
    }
}

impl FileCursor for ScriptedCursor {
    fn seek_to(&mut self, _key: &Record) -> Result<SeekResult> {
        if self.fail_on_seek {
            return Err((self.error)());
        }
        Ok(SeekResult::BeforeFirst)
    }

    fn reseek_to(&mut self, key: &Record) -> Result<SeekResult> {
        self.seek_to(key)
    }

    fn seek_to_first(&mut self) -> Result<bool> {
        self.current = Some(self.record.clone());
        Ok(true)
    }

    fn seek_before(&mut self, _key: &Record) -> Result<bool> {
        Err((self.error)())
    }

    fn next(&mut self) -> Result<bool> {
        Err((self.error)())
    }

    fn current(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    fn is_seeked(&self) -> bool {
        self.current.is_some()
    }

    fn close(&mut self) {
        self.current = None;
    }
}

fn io_error() -> StrataError {
    StrataError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
}

fn missing_error() -> StrataError {
    StrataError::SourceMissing {
        path: Path::new("/gone.sst").to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
    }
}

// =============================================================================
// Visibility Tests
// =============================================================================

#[test]
fn test_seek_skips_invisible_version() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, 4);

    assert!(scanner.enforces_visibility());
    assert!(scanner.seek(&Record::first_on_row("a")).unwrap());
    assert_eq!(scanner.peek().unwrap().timestamp, 9);

    // ts=9 comes back, then nothing: row b (seq 7) is invisible
    assert_eq!(scanner.next().unwrap().unwrap().timestamp, 9);
    assert!(scanner.peek().is_none());
    assert!(scanner.next().unwrap().is_none());
}

#[test]
fn test_read_point_is_inclusive() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, 5);

    assert!(scanner.seek(&Record::first_on_row("a")).unwrap());
    let seen: Vec<u64> = drain(&mut scanner).iter().map(|r| r.timestamp).collect();
    assert_eq!(seen, vec![10, 9]);
}

#[test]
fn test_everything_visible_at_high_read_point() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, 7);

    assert!(scanner.seek(&Record::first_on_row("")).unwrap());
    assert_eq!(drain(&mut scanner), scenario_records());
}

#[test]
fn test_seek_with_nothing_visible() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, 2);

    assert!(!scanner.seek(&Record::first_on_row("a")).unwrap());
    assert!(scanner.peek().is_none());
    assert!(scanner.real_seek_done());
}

#[test]
fn test_compaction_sees_every_version() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let options = CursorOptions {
        cache_blocks: false,
        use_pread: false,
        compaction: true,
    };
    let mut scanner = RecordScanner::open(&reader, options, 0, 0);

    assert!(!scanner.enforces_visibility());
    assert!(scanner.seek(&Record::first_on_row("")).unwrap());
    assert_eq!(drain(&mut scanner).len(), 3);
}

#[test]
fn test_file_without_sequences_is_not_filtered() {
    let temp = TempDir::new().unwrap();
    let records = vec![put("a", 2, 0), put("b", 1, 0)];
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &records);
    let mut scanner = scanner(&reader, 0);

    assert!(!scanner.enforces_visibility());
    assert!(scanner.seek(&Record::first_on_row("")).unwrap());
    assert_eq!(drain(&mut scanner).len(), 2);
}

#[test]
fn test_reseek_moves_forward_with_visibility() {
    let temp = TempDir::new().unwrap();
    let records = vec![put("a", 1, 1), put("b", 2, 8), put("b", 1, 2), put("c", 1, 3)];
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &records);
    let mut scanner = scanner(&reader, 5);

    assert!(scanner.seek(&Record::first_on_row("a")).unwrap());
    assert!(scanner.reseek(&Record::first_on_row("b")).unwrap());
    assert_eq!(scanner.peek().unwrap(), &records[2]);

    assert!(scanner.reseek(&Record::first_on_row("c")).unwrap());
    assert_eq!(row(scanner.peek()), b"c");

    assert!(!scanner.reseek(&Record::first_on_row("d")).unwrap());
    assert!(scanner.peek().is_none());
}

#[test]
fn test_next_at_end_is_noop() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, u64::MAX);

    // Never positioned
    assert!(scanner.next().unwrap().is_none());

    assert!(!scanner.seek(&Record::first_on_row("zzz")).unwrap());
    assert!(scanner.next().unwrap().is_none());
    assert!(scanner.next().unwrap().is_none());
}

// =============================================================================
// Bulk Load Tests
// =============================================================================

#[test]
fn test_bulk_loaded_records_take_file_sequence() {
    let temp = TempDir::new().unwrap();
    let records = vec![put("a", 1, 0), put("b", 1, 0)];
    let reader = write_reader(&temp, "bulk.sst", BuildOptions::default().bulk_load(8), &records);

    let mut hidden = scanner(&reader, 5);
    assert!(hidden.enforces_visibility());
    assert!(!hidden.seek(&Record::first_on_row("")).unwrap());

    let mut visible = scanner(&reader, 8);
    assert!(visible.seek(&Record::first_on_row("")).unwrap());
    let seen = drain(&mut visible);
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|r| r.sequence == 8));
}

#[test]
fn test_bulk_load_can_keep_record_sequences() {
    let temp = TempDir::new().unwrap();
    let records = vec![put("a", 1, 2), put("b", 1, 6)];
    let options = BuildOptions::default().bulk_load(8).skip_reset_seq_id(true);
    let reader = write_reader(&temp, "bulk.sst", options, &records);
    assert!(reader.is_skip_reset_seq_id());

    let mut scanner = scanner(&reader, 5);
    assert!(scanner.seek(&Record::first_on_row("")).unwrap());
    assert_eq!(drain(&mut scanner), vec![records[0].clone()]);
}

// =============================================================================
// Lazy Seek Tests
// =============================================================================

#[test]
fn test_request_seek_defers_past_max_timestamp() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut lazy = scanner(&reader, u64::MAX);
    let mut eager = scanner(&reader, u64::MAX);

    // Newest-possible key is above the file's max timestamp (10)
    let key = Record::first_on_row_col("a", "cf", "q");
    assert!(lazy.request_seek(&key, false, true).unwrap());
    assert!(!lazy.real_seek_done());
    assert_eq!(lazy.seek_count(), 0);
    assert_eq!(lazy.peek(), Some(&key.first_on_row_col_ts(10)));

    lazy.enforce_seek().unwrap();
    assert!(lazy.real_seek_done());
    assert_eq!(lazy.seek_count(), 1);

    eager.seek(&key).unwrap();
    assert_eq!(lazy.peek(), eager.peek());

    // Materialized once
    lazy.enforce_seek().unwrap();
    assert_eq!(lazy.seek_count(), 1);
}

#[test]
fn test_request_seek_within_time_range_seeks_now() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, u64::MAX);

    let key = put("a", 9, 0).key_only();
    assert!(scanner.request_seek(&key, false, true).unwrap());
    assert!(scanner.real_seek_done());
    assert_eq!(scanner.seek_count(), 1);
    assert_eq!(scanner.peek().unwrap().timestamp, 9);
}

#[test]
fn test_forward_request_seek_reseeks() {
    let temp = TempDir::new().unwrap();
    let records = vec![put("a", 1, 1), put("b", 1, 1), put("c", 1, 1)];
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &records);
    let mut scanner = scanner(&reader, u64::MAX);

    scanner.seek(&Record::first_on_row("a")).unwrap();
    let key = Record::first_on_row_col("c", "cf", "q");
    assert!(scanner.request_seek(&key, true, false).unwrap());
    scanner.enforce_seek().unwrap();
    assert_eq!(scanner.peek(), Some(&records[2]));
}

#[test]
fn test_row_col_bloom_skips_seek() {
    let temp = TempDir::new().unwrap();
    let records: Vec<Record> = (0..20).map(|i| put(&format!("r{:02}", i), 5, 1)).collect();
    let options = BuildOptions::default().bloom_type(BloomType::RowCol);
    let reader = write_reader(&temp, "f.sst", options, &records);
    let mut scanner = scanner(&reader, u64::MAX);

    let key = absent_column(&reader, "r05");
    assert!(scanner.request_seek(&key, false, true).unwrap());
    assert!(scanner.real_seek_done());
    assert_eq!(scanner.seek_count(), 0);

    // Placeholder sorts after the column and before the next row
    let placeholder = scanner.peek().unwrap().clone();
    assert_eq!(compare_keys(&placeholder, &key), Ordering::Greater);
    assert_eq!(
        compare_keys(&placeholder, &Record::first_on_row("r06")),
        Ordering::Less
    );
    assert_eq!(placeholder, key.last_on_row_col());
}

#[test]
fn test_bloom_ignored_when_disabled_or_family_empty() {
    let temp = TempDir::new().unwrap();
    let records: Vec<Record> = (0..20).map(|i| put(&format!("r{:02}", i), 5, 1)).collect();
    let options = BuildOptions::default().bloom_type(BloomType::RowCol);
    let reader = write_reader(&temp, "f.sst", options, &records);

    let key = absent_column(&reader, "r05");
    let mut no_bloom = scanner(&reader, u64::MAX);
    no_bloom.request_seek(&key, false, false).unwrap();
    assert!(!no_bloom.real_seek_done());

    let empty_family = Record::first_on_row_col("r05", "", key.qualifier.clone());
    let mut family_less = scanner(&reader, u64::MAX);
    family_less.request_seek(&empty_family, false, true).unwrap();
    assert!(!family_less.real_seek_done());
}

#[test]
fn test_delete_family_bloom_skips_seek() {
    let temp = TempDir::new().unwrap();
    let records: Vec<Record> = (0..5).map(|i| put(&format!("r{:02}", i), 5, 1)).collect();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &records);
    let key = Record::first_delete_family("r02", "cf");
    assert_eq!(key.record_type, RecordType::DeleteFamily);

    // Explicit columns: the family delete marker can be looked up by row
    let mut scanner_a = scanner(&reader, u64::MAX);
    scanner_a.set_matcher(Some(Arc::new(ScanQueryMatcher::new(false))));
    assert!(scanner_a.request_seek(&key, false, true).unwrap());
    assert!(scanner_a.real_seek_done());
    assert_eq!(scanner_a.seek_count(), 0);
    assert_eq!(scanner_a.peek(), Some(&key.last_on_row_col()));

    // Whole-family query: no shortcut
    let mut scanner_b = scanner(&reader, u64::MAX);
    scanner_b.set_matcher(Some(Arc::new(ScanQueryMatcher::new(true))));
    scanner_b.request_seek(&key, false, true).unwrap();
    assert!(!scanner_b.real_seek_done());

    // No matcher: no shortcut
    let mut scanner_c = scanner(&reader, u64::MAX);
    scanner_c.request_seek(&key, false, true).unwrap();
    assert!(!scanner_c.real_seek_done());
}

// =============================================================================
// Reverse Positioning Tests
// =============================================================================

#[test]
fn test_seek_to_previous_row_skips_invisible_version() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &previous_row_records());
    let mut scanner = scanner(&reader, 5);

    assert!(scanner.seek_to_previous_row(&Record::first_on_row("5")).unwrap());
    let current = scanner.peek().unwrap();
    assert_eq!(&current.row[..], b"3");
    assert_eq!(current.timestamp, 10);
    assert_eq!(current.sequence, 2);
    assert!(scanner.real_seek_done());
}

#[test]
fn test_seek_to_previous_row_skips_invisible_row() {
    let temp = TempDir::new().unwrap();
    let records = vec![put("1", 1, 1), put("3", 1, 9), put("5", 1, 3)];
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &records);
    let mut scanner = scanner(&reader, 5);

    assert!(scanner.seek_to_previous_row(&Record::first_on_row("5")).unwrap());
    assert_eq!(row(scanner.peek()), b"1");
    // Two real seeks per row visited
    assert_eq!(scanner.seek_count(), 4);
}

#[test]
fn test_seek_to_previous_row_before_first_row() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &previous_row_records());
    let mut scanner = scanner(&reader, 5);

    assert!(!scanner.seek_to_previous_row(&Record::first_on_row("1")).unwrap());
    assert!(scanner.peek().is_none());

    // Nothing visible before row 3 once row 1 is hidden too
    let mut strict = self::scanner(&reader, 0);
    assert!(!strict.seek_to_previous_row(&Record::first_on_row("5")).unwrap());
}

#[test]
fn test_seek_to_last_row() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &previous_row_records());

    let mut scanner = scanner(&reader, 5);
    assert!(scanner.seek_to_last_row().unwrap());
    assert_eq!(row(scanner.peek()), b"5");

    // Last row invisible: falls back to the previous row
    let records = vec![put("1", 1, 1), put("3", 1, 2), put("5", 1, 9)];
    let reader = write_reader(&temp, "g.sst", BuildOptions::default(), &records);
    let mut scanner = self::scanner(&reader, 5);
    assert!(scanner.seek_to_last_row().unwrap());
    assert_eq!(row(scanner.peek()), b"3");
}

#[test]
fn test_backward_seek() {
    let temp = TempDir::new().unwrap();
    let records = vec![put("1", 1, 1), put("3", 1, 2), put("5", 1, 3)];
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &records);
    let mut scanner = scanner(&reader, u64::MAX);

    // Landing on a later row goes back to the row before the key
    assert!(scanner.backward_seek(&Record::first_on_row("4")).unwrap());
    assert_eq!(row(scanner.peek()), b"3");

    assert!(scanner.backward_seek(&Record::first_on_row("3")).unwrap());
    assert_eq!(row(scanner.peek()), b"3");

    // Past the end
    assert!(scanner.backward_seek(&Record::first_on_row("9")).unwrap());
    assert_eq!(row(scanner.peek()), b"5");
}

// =============================================================================
// Should Use Scanner Tests
// =============================================================================

#[test]
fn test_should_use_scanner() {
    let temp = TempDir::new().unwrap();
    // rows r00..r19 at timestamp 5
    let records: Vec<Record> = (0..20).map(|i| put(&format!("r{:02}", i), 5, 1)).collect();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &records);
    let scanner = scanner(&reader, u64::MAX);

    assert!(scanner.should_use_scanner(&Scan::new(), b"cf", 0));
    assert!(scanner.should_use_scanner(&Scan::get("r07"), b"cf", 0));

    let later = Scan::new().with_time_range(TimeRange::new(6, 100).unwrap());
    assert!(!scanner.should_use_scanner(&later, b"cf", 0));

    // Per-family range overrides the scan range
    let family_range = later.with_family_time_range("cf", TimeRange::at(5));
    assert!(scanner.should_use_scanner(&family_range, b"cf", 0));

    assert!(!scanner.should_use_scanner(&Scan::new().with_start_row("s"), b"cf", 0));
    assert!(!scanner.should_use_scanner(&Scan::new(), b"cf", 6));

    // A row the bloom filter rules out
    let absent = (0..1000)
        .map(|i| format!("r05-{}", i))
        .find(|r| !reader.passes_row_bloom_filter(r.as_bytes()))
        .unwrap();
    assert!(!scanner.should_use_scanner(&Scan::get(absent), b"cf", 0));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_close_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, u64::MAX);
    assert_eq!(reader.ref_count(), 1);

    scanner.seek(&Record::first_on_row("a")).unwrap();
    scanner.close();
    assert_eq!(reader.ref_count(), 0);
    assert!(scanner.is_closed());
    assert!(scanner.peek().is_none());

    scanner.close();
    drop(scanner);
    assert_eq!(reader.ref_count(), 0);
}

#[test]
fn test_drop_releases_reference() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());

    let first = scanner(&reader, u64::MAX);
    let second = scanner(&reader, u64::MAX);
    assert_eq!(reader.ref_count(), 2);

    drop(first);
    assert_eq!(reader.ref_count(), 1);
    drop(second);
    assert_eq!(reader.ref_count(), 0);
}

#[test]
fn test_seek_after_close_fails() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, u64::MAX);
    scanner.close();

    let result = scanner.seek(&Record::first_on_row("a"));
    assert!(matches!(result, Err(StrataError::InvalidArgument(_))));
}

#[test]
fn test_display_identifies_scanner() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let mut scanner = scanner(&reader, u64::MAX);

    let text = scanner.to_string();
    assert!(text.starts_with("RecordScanner["));
    assert!(text.contains("f.sst"));
    assert!(text.ends_with("cur=null]"));

    scanner.seek(&Record::first_on_row("a")).unwrap();
    assert!(scanner.to_string().contains("a/cf:q/10"));
    assert!(scanner.is_file_scanner());
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_seek_failure_is_annotated() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let cursor = ScriptedCursor::new(put("a", 10, 1), true, io_error);
    let mut scanner = RecordScanner::new(Arc::clone(&reader), Box::new(cursor), true, u64::MAX, 0);

    let key = Record::first_on_row("a");
    let err = scanner.seek(&key).unwrap_err();
    match &err {
        StrataError::Scan { op, key: k, source, .. } => {
            assert_eq!(*op, ScanOp::Seek);
            assert_eq!(k, &key.to_string());
            assert!(matches!(**source, StrataError::Io(_)));
        }
        other => panic!("expected scan error, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.starts_with("Could not seek RecordScanner["));
    assert!(message.contains("disk on fire"));
}

#[test]
fn test_reseek_failure_is_annotated() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let cursor = ScriptedCursor::new(put("a", 10, 1), true, io_error);
    let mut scanner = RecordScanner::new(Arc::clone(&reader), Box::new(cursor), true, u64::MAX, 0);

    // Newer than anything in the file: the forward seek stays pending
    let key = Record::first_on_row_col("b", "cf", "q");
    assert!(scanner.request_seek(&key, true, false).unwrap());
    assert!(!scanner.real_seek_done());

    let err = scanner.enforce_seek().unwrap_err();
    match &err {
        StrataError::Scan { op, key: k, .. } => {
            assert_eq!(*op, ScanOp::Reseek);
            assert_eq!(k, &key.to_string());
        }
        other => panic!("expected scan error, got {:?}", other),
    }
    assert!(err.to_string().starts_with("Could not reseek RecordScanner["));

    let err = scanner.reseek(&Record::first_on_row("a")).unwrap_err();
    assert!(matches!(err, StrataError::Scan { op: ScanOp::Reseek, .. }));
}

#[test]
fn test_next_failure_is_annotated() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());
    let cursor = ScriptedCursor::new(put("a", 10, 1), false, io_error);
    let mut scanner = RecordScanner::new(Arc::clone(&reader), Box::new(cursor), true, u64::MAX, 0);

    assert!(scanner.seek(&Record::first_on_row("")).unwrap());
    let err = scanner.next().unwrap_err();
    assert!(matches!(err, StrataError::Scan { op: ScanOp::Iterate, .. }));

    let err = scanner
        .seek_to_previous_row(&Record::first_on_row("b"))
        .unwrap_err();
    assert!(matches!(
        err,
        StrataError::Scan { op: ScanOp::SeekToPreviousRow, .. }
    ));
}

#[test]
fn test_missing_source_is_not_wrapped() {
    let temp = TempDir::new().unwrap();
    let reader = write_reader(&temp, "f.sst", BuildOptions::default(), &scenario_records());

    let cursor = ScriptedCursor::new(put("a", 10, 1), true, missing_error);
    let mut scanner = RecordScanner::new(Arc::clone(&reader), Box::new(cursor), true, u64::MAX, 0);
    let err = scanner.seek(&Record::first_on_row("a")).unwrap_err();
    assert!(matches!(err, StrataError::SourceMissing { .. }));

    let cursor = ScriptedCursor::new(put("a", 10, 1), false, missing_error);
    let mut scanner = RecordScanner::new(Arc::clone(&reader), Box::new(cursor), true, u64::MAX, 0);
    scanner.seek(&Record::first_on_row("")).unwrap();
    let err = scanner.next().unwrap_err();
    assert!(matches!(err, StrataError::SourceMissing { .. }));
    assert!(err.is_source_missing());
}

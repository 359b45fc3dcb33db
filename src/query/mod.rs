//! Query Module
//!
//! The parts of a read request the scanners consult: row range, time
//! ranges, requested columns, and the query matcher predicate used by the
//! delete-family bloom shortcut.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use bytes::Bytes;

use crate::error::{Result, StrataError};

/// Half-open timestamp interval `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    min: u64,
    max: u64,
}

impl TimeRange {
    /// `[min, max)`; rejects `min > max`
    pub fn new(min: u64, max: u64) -> Result<Self> {
        if min > max {
            return Err(StrataError::InvalidArgument(format!(
                "Time range min {} is after max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Every timestamp
    pub fn all_time() -> Self {
        Self { min: 0, max: u64::MAX }
    }

    /// `[ts, ts + 1)`
    pub fn at(ts: u64) -> Self {
        Self {
            min: ts,
            max: ts.saturating_add(1),
        }
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn is_all_time(&self) -> bool {
        self.min == 0 && self.max == u64::MAX
    }

    pub fn contains(&self, ts: u64) -> bool {
        ts >= self.min && (ts < self.max || self.is_all_time())
    }

    /// Overlap with a file whose timestamps span `[file_min, file_max]`
    pub fn overlaps_file(&self, file_min: u64, file_max: u64) -> bool {
        if file_min > file_max {
            return false;
        }
        if self.is_all_time() {
            return true;
        }
        file_min < self.max && file_max >= self.min
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::all_time()
    }
}

/// A read request over one or more column families
///
/// An empty `stop_row` means "to the end of the table". For reversed scans
/// `start_row` is the largest row and `stop_row` the smallest.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    start_row: Bytes,
    stop_row: Bytes,
    reversed: bool,
    get: bool,
    time_range: TimeRange,
    family_time_ranges: HashMap<Bytes, TimeRange>,
    /// family → requested qualifiers (empty set = whole family)
    families: BTreeMap<Bytes, BTreeSet<Bytes>>,
}

impl Scan {
    /// Full-table scan
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-row lookup
    pub fn get(row: impl Into<Bytes>) -> Self {
        let row = row.into();
        Self {
            start_row: row.clone(),
            stop_row: row,
            get: true,
            ..Self::default()
        }
    }

    pub fn with_start_row(mut self, row: impl Into<Bytes>) -> Self {
        self.start_row = row.into();
        self
    }

    pub fn with_stop_row(mut self, row: impl Into<Bytes>) -> Self {
        self.stop_row = row.into();
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = range;
        self
    }

    /// Override the time range for one family
    pub fn with_family_time_range(mut self, family: impl Into<Bytes>, range: TimeRange) -> Self {
        self.family_time_ranges.insert(family.into(), range);
        self
    }

    /// Request a whole family
    pub fn add_family(mut self, family: impl Into<Bytes>) -> Self {
        self.families.entry(family.into()).or_default().clear();
        self
    }

    /// Request one column
    pub fn add_column(mut self, family: impl Into<Bytes>, qualifier: impl Into<Bytes>) -> Self {
        self.families
            .entry(family.into())
            .or_default()
            .insert(qualifier.into());
        self
    }

    pub fn start_row(&self) -> &[u8] {
        &self.start_row
    }

    pub fn stop_row(&self) -> &[u8] {
        &self.stop_row
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_get_scan(&self) -> bool {
        self.get
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// The family's own time range, else the scan-wide one
    pub fn time_range_for(&self, family: &[u8]) -> TimeRange {
        self.family_time_ranges
            .get(family)
            .copied()
            .unwrap_or(self.time_range)
    }

    /// Requested qualifiers of `family`; `None` or empty = every column
    pub fn columns(&self, family: &[u8]) -> Option<&BTreeSet<Bytes>> {
        self.families.get(family)
    }
}

/// Query-side predicates a scanner may consult during lazy seeks
#[derive(Debug, Clone)]
pub struct ScanQueryMatcher {
    has_null_column: bool,
}

impl ScanQueryMatcher {
    pub fn new(has_null_column: bool) -> Self {
        Self { has_null_column }
    }

    /// Matcher for `family` of `scan`
    ///
    /// A query has a null column when it asks for the whole family or
    /// explicitly for the empty qualifier.
    pub fn for_family(scan: &Scan, family: &[u8]) -> Self {
        let has_null_column = match scan.columns(family) {
            None => true,
            Some(columns) => columns.first().map_or(true, |q| q.is_empty()),
        };
        Self { has_null_column }
    }

    pub fn has_null_column_in_query(&self) -> bool {
        self.has_null_column
    }
}

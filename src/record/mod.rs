//! Record Module
//!
//! Versioned key-value records as stored in store files.
//!
//! ## Ordering
//! ```text
//! row ASC | family ASC | qualifier ASC | timestamp DESC | type DESC | sequence DESC
//! ```
//! A "last on row" key (empty family and qualifier, type `Minimum`) sorts
//! after every real record of its row.
//!
//! ## Sentinel keys
//! Seeks are expressed with synthetic keys that never exist in a file:
//! `first_on_row`, `last_on_row`, `first_on_row_col`, `last_on_row_col`,
//! `first_on_row_col_ts`, `first_delete_family`.

mod codec;
mod comparator;

use std::fmt;

use bytes::Bytes;

pub use codec::{decode_record, encode_record, encoded_len};
pub use comparator::{compare_keys, compare_records, compare_rows};

use crate::error::{Result, StrataError};

/// Newest possible timestamp; used by "first on" sentinels
pub const LATEST_TIMESTAMP: u64 = u64::MAX;

/// Oldest possible timestamp; used by "last on" sentinels
pub const OLDEST_TIMESTAMP: u64 = 0;

/// Kind of record. Higher codes sort first at equal row/column/timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum RecordType {
    Minimum = 0,
    Put = 4,
    Delete = 8,
    DeleteFamilyVersion = 10,
    DeleteColumn = 12,
    DeleteFamily = 14,
    Maximum = 255,
}

impl RecordType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(RecordType::Minimum),
            4 => Ok(RecordType::Put),
            8 => Ok(RecordType::Delete),
            10 => Ok(RecordType::DeleteFamilyVersion),
            12 => Ok(RecordType::DeleteColumn),
            14 => Ok(RecordType::DeleteFamily),
            255 => Ok(RecordType::Maximum),
            other => Err(StrataError::Corruption(format!(
                "Unknown record type code: {}",
                other
            ))),
        }
    }

    /// Family-level delete markers (whole family, or one version of it)
    pub fn is_delete_family(self) -> bool {
        matches!(self, RecordType::DeleteFamily | RecordType::DeleteFamilyVersion)
    }
}

/// A single versioned record
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    pub row: Bytes,
    pub family: Bytes,
    pub qualifier: Bytes,
    pub timestamp: u64,
    pub record_type: RecordType,
    /// Visibility version; records above a scanner's read point are hidden
    pub sequence: u64,
    pub value: Bytes,
}

impl Record {
    /// A `Put` record
    pub fn put(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        timestamp: u64,
        sequence: u64,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
            record_type: RecordType::Put,
            sequence,
            value: value.into(),
        }
    }

    /// A value-less marker record of the given type
    pub fn marker(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        timestamp: u64,
        record_type: RecordType,
        sequence: u64,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
            record_type,
            sequence,
            value: Bytes::new(),
        }
    }

    fn sentinel(
        row: Bytes,
        family: Bytes,
        qualifier: Bytes,
        timestamp: u64,
        record_type: RecordType,
    ) -> Self {
        Self {
            row,
            family,
            qualifier,
            timestamp,
            record_type,
            sequence: 0,
            value: Bytes::new(),
        }
    }

    /// Smallest possible key of `row`
    pub fn first_on_row(row: impl Into<Bytes>) -> Self {
        Self::sentinel(
            row.into(),
            Bytes::new(),
            Bytes::new(),
            LATEST_TIMESTAMP,
            RecordType::Maximum,
        )
    }

    /// Largest possible key of `row`
    pub fn last_on_row(row: impl Into<Bytes>) -> Self {
        Self::sentinel(
            row.into(),
            Bytes::new(),
            Bytes::new(),
            OLDEST_TIMESTAMP,
            RecordType::Minimum,
        )
    }

    /// Smallest possible key of a row/column
    pub fn first_on_row_col(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
    ) -> Self {
        Self::sentinel(
            row.into(),
            family.into(),
            qualifier.into(),
            LATEST_TIMESTAMP,
            RecordType::Maximum,
        )
    }

    /// Largest possible key of this record's row/column
    pub fn last_on_row_col(&self) -> Self {
        Self::sentinel(
            self.row.clone(),
            self.family.clone(),
            self.qualifier.clone(),
            OLDEST_TIMESTAMP,
            RecordType::Minimum,
        )
    }

    /// Smallest key of this record's row/column at timestamp `ts`
    pub fn first_on_row_col_ts(&self, ts: u64) -> Self {
        Self::sentinel(
            self.row.clone(),
            self.family.clone(),
            self.qualifier.clone(),
            ts,
            RecordType::Maximum,
        )
    }

    /// Newest possible family delete marker of `row`/`family`
    pub fn first_delete_family(row: impl Into<Bytes>, family: impl Into<Bytes>) -> Self {
        Self::sentinel(
            row.into(),
            family.into(),
            Bytes::new(),
            LATEST_TIMESTAMP,
            RecordType::DeleteFamily,
        )
    }

    /// Copy of this record without its value (index keys, seek targets)
    pub fn key_only(&self) -> Self {
        Self {
            value: Bytes::new(),
            ..self.clone()
        }
    }

    /// True for a `first_on_row` sentinel
    pub fn is_first_on_row(&self) -> bool {
        self.family.is_empty()
            && self.qualifier.is_empty()
            && self.record_type == RecordType::Maximum
    }

    /// True for a `last_on_row` sentinel
    pub fn is_last_on_row(&self) -> bool {
        self.family.is_empty()
            && self.qualifier.is_empty()
            && self.record_type == RecordType::Minimum
    }
}

/// Renders bytes as text when printable, else as escaped hex
pub(crate) fn fmt_bytes(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for &b in bytes {
        if b.is_ascii_graphic() || b == b' ' {
            write!(f, "{}", b as char)?;
        } else {
            write!(f, "\\x{:02X}", b)?;
        }
    }
    Ok(())
}

impl fmt::Display for Record {
    /// `row/family:qualifier/timestamp/Type/seqid=N`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_bytes(f, &self.row)?;
        f.write_str("/")?;
        fmt_bytes(f, &self.family)?;
        f.write_str(":")?;
        fmt_bytes(f, &self.qualifier)?;
        if self.timestamp == LATEST_TIMESTAMP {
            f.write_str("/LATEST_TIMESTAMP")?;
        } else {
            write!(f, "/{}", self.timestamp)?;
        }
        write!(f, "/{:?}/seqid={}", self.record_type, self.sequence)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({}, vlen={})", self, self.value.len())
    }
}

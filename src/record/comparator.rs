//! Record comparator
//!
//! Key order used for seeking, and the total record order used inside a
//! store file and by scanner merging.

use std::cmp::Ordering;

use super::Record;

/// Compare only the row component
pub fn compare_rows(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Compare record keys, ignoring the sequence number
///
/// Seek targets are compared with this so that a target never lands past
/// duplicate versions of the same key.
pub fn compare_keys(a: &Record, b: &Record) -> Ordering {
    let rows = compare_rows(&a.row, &b.row);
    if rows != Ordering::Equal {
        return rows;
    }

    // "last on row" sorts after every column of its row
    match (a.is_last_on_row(), b.is_last_on_row()) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    a.family
        .cmp(&b.family)
        .then_with(|| a.qualifier.cmp(&b.qualifier))
        .then_with(|| b.timestamp.cmp(&a.timestamp))
        .then_with(|| b.record_type.code().cmp(&a.record_type.code()))
}

/// Total record order: key order, then sequence descending (newest first)
pub fn compare_records(a: &Record, b: &Record) -> Ordering {
    compare_keys(a, b).then_with(|| b.sequence.cmp(&a.sequence))
}

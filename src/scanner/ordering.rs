use std::cmp::Ordering;

use crate::record::compare_records;

use super::KeyValueScanner;

/// Order two scanners by their current records
///
/// Exhausted scanners sort last. When both records compare equal the
/// scanner with the higher `scanner_order` (the newer file) comes first.
/// Suitable for a merge heap that pops the smallest scanner.
pub fn compare_scanners(a: &dyn KeyValueScanner, b: &dyn KeyValueScanner) -> Ordering {
    let by_record = match (a.peek(), b.peek()) {
        (Some(left), Some(right)) => compare_records(left, right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_record.then_with(|| b.scanner_order().cmp(&a.scanner_order()))
}

//! Filter Module
//!
//! Bloom filters attached to store files, used to skip files that cannot
//! contain a row (or row/column) without touching their data.

mod bloom;

use serde::{Deserialize, Serialize};

pub use bloom::BloomFilterPolicy;

/// Filter policy trait for determining if a key might exist
pub trait FilterPolicy: Send + Sync {
    /// Returns the name of this filter policy
    fn name(&self) -> &str;

    /// Create a filter for the given keys
    fn create_filter(&self, keys: &[Vec<u8>]) -> Vec<u8>;

    /// Test if the key may exist in the filter
    /// Returns false if definitely not in filter, true if might be in filter
    fn may_contain(&self, filter: &[u8], key: &[u8]) -> bool;
}

/// What the general bloom filter of a store file is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloomType {
    /// No general bloom filter
    None,
    /// Keyed on the row
    Row,
    /// Keyed on row + qualifier
    RowCol,
}

/// Bloom key for a `RowCol` filter: `[RowLen: u16][Row][Qualifier]`
pub fn row_col_bloom_key(row: &[u8], qualifier: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + row.len() + qualifier.len());
    key.extend_from_slice(&(row.len() as u16).to_le_bytes());
    key.extend_from_slice(row);
    key.extend_from_slice(qualifier);
    key
}

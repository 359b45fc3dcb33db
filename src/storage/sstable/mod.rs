//! SSTable Module
//!
//! Store file - immutable on-disk sorted storage of versioned records.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (6 bytes)                                        │
//! │   Magic: "STRA" (4) | Version: u16 (2)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [EntryLen: u32][Encoded Record]                       │
//! │   ... repeated for each record, in record order ...     │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index Block (variable)                                  │
//! │   [KeyLen: u32][Key-only Record][Offset: u64][Len: u32] │
//! ├─────────────────────────────────────────────────────────┤
//! │ General Bloom Block (row or row+qualifier keys)         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Delete-Family Bloom Block (rows with family deletes)    │
//! ├─────────────────────────────────────────────────────────┤
//! │ File Info Block (bincode FileInfo)                      │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (72 bytes)                                       │
//! │   4 x (Offset: u64, Len: u64) | DataCRC: u32 | Pad (4)  │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod cursor;
mod reader;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use builder::{BuildOptions, SSTableBuilder};
pub use cursor::{CursorOptions, FileCursor, SSTableCursor, SeekResult};
pub use reader::StoreFileReader;

use crate::error::{Result, StrataError};
use crate::filter::BloomType;

// =============================================================================
// Shared Constants (used by builder, reader, cursor)
// =============================================================================

/// Magic bytes identifying a strata store file
pub(crate) const MAGIC: &[u8; 4] = b"STRA";

/// Current store file format version
pub(crate) const VERSION: u16 = 2;

/// Header size: Magic (4) + Version (2) = 6 bytes
pub(crate) const HEADER_SIZE: u64 = 6;

/// Footer size: 4 block handles (16 each) + DataCRC (4) + Padding (4) = 72 bytes
pub(crate) const FOOTER_SIZE: u64 = 72;

/// Length prefix in front of every data entry
pub(crate) const ENTRY_PREFIX: usize = 4;

// =============================================================================
// File Info
// =============================================================================

/// Metadata written once at the end of a store file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub entry_count: u64,
    /// Smallest record timestamp (`u64::MAX` when empty)
    pub min_timestamp: u64,
    /// Largest record timestamp (0 when empty)
    pub max_timestamp: u64,
    /// Max record sequence, or the id assigned by a bulk load
    pub sequence_id: u64,
    pub bulk_loaded: bool,
    /// Keep on-disk sequences of a bulk-loaded file instead of rewriting them
    pub skip_reset_seq_id: bool,
    /// Records carry real sequence numbers
    pub has_mvcc_info: bool,
    pub bloom_type: BloomType,
    pub bloom_bits_per_key: u32,
    /// Number of `DeleteFamily`/`DeleteFamilyVersion` markers
    pub delete_family_count: u64,
    pub first_row: Option<Vec<u8>>,
    pub last_row: Option<Vec<u8>>,
    pub created_at_ms: u64,
}

/// Metadata of a freshly written store file
#[derive(Debug, Clone)]
pub struct StoreFileMeta {
    pub path: PathBuf,
    pub file_size: u64,
    pub info: FileInfo,
}

// =============================================================================
// Footer
// =============================================================================

/// Location of a block inside the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BlockHandle {
    pub offset: u64,
    pub len: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Footer {
    pub index: BlockHandle,
    pub bloom: BlockHandle,
    pub delete_bloom: BlockHandle,
    pub info: BlockHandle,
    pub data_crc: u32,
}

impl Footer {
    pub fn encode(&self) -> [u8; FOOTER_SIZE as usize] {
        let mut out = [0u8; FOOTER_SIZE as usize];
        let handles = [self.index, self.bloom, self.delete_bloom, self.info];
        for (i, handle) in handles.iter().enumerate() {
            let at = i * 16;
            out[at..at + 8].copy_from_slice(&handle.offset.to_le_bytes());
            out[at + 8..at + 16].copy_from_slice(&handle.len.to_le_bytes());
        }
        out[64..68].copy_from_slice(&self.data_crc.to_le_bytes());
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != FOOTER_SIZE as usize {
            return Err(StrataError::Corruption(format!(
                "Footer must be {} bytes, got {}",
                FOOTER_SIZE,
                data.len()
            )));
        }
        let u64_at = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&data[at..at + 8]);
            u64::from_le_bytes(raw)
        };
        let handle_at = |i: usize| BlockHandle {
            offset: u64_at(i * 16),
            len: u64_at(i * 16 + 8),
        };
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&data[64..68]);

        Ok(Self {
            index: handle_at(0),
            bloom: handle_at(1),
            delete_bloom: handle_at(2),
            info: handle_at(3),
            data_crc: u32::from_le_bytes(crc),
        })
    }
}

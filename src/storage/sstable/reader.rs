//! Store File Reader
//!
//! Opens store files, keeps their index, bloom filters and file info in
//! memory, and answers the metadata questions scanners ask.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::{Buf, Bytes};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::filter::{row_col_bloom_key, BloomFilterPolicy, BloomType, FilterPolicy};
use crate::query::{Scan, TimeRange};
use crate::record::{decode_record, Record};

use super::cursor::{CursorOptions, SSTableCursor};
use super::{BlockHandle, FileInfo, Footer, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// One in-memory index entry: the record key and where its entry lives
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    pub key: Record,
    pub offset: u64,
    pub len: u32,
}

/// Shared reader of one store file
///
/// Shared between scanners through `Arc`; every scanner holds one
/// reference in `ref_count` until it is closed.
#[derive(Debug)]
pub struct StoreFileReader {
    path: PathBuf,
    file_size: u64,
    info: FileInfo,
    /// Every record key, in file order
    index: Vec<IndexEntry>,
    general_bloom: Option<Vec<u8>>,
    delete_family_bloom: Option<Vec<u8>>,
    policy: BloomFilterPolicy,
    /// Handle shared by positional-read cursors
    shared: Mutex<File>,
    /// Decoded entries memoized by offset
    entry_cache: Mutex<HashMap<u64, Record>>,
    entry_cache_capacity: usize,
    stream_buffer_size: usize,
    compaction_readahead: usize,
    ref_count: AtomicUsize,
    primary_replica: AtomicBool,
}

/// Open a file, reporting a missing file as `SourceMissing`
pub(crate) fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StrataError::SourceMissing {
                path: path.to_path_buf(),
                source: e,
            }
        } else {
            StrataError::Io(e)
        }
    })
}

fn read_block(file: &mut File, handle: BlockHandle) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(handle.offset))?;
    let mut data = vec![0u8; handle.len as usize];
    file.read_exact(&mut data)?;
    Ok(data)
}

/// Decode the index block; every entry must lie inside the data block
/// that ends at `data_end`
fn parse_index(data: Vec<u8>, data_end: u64) -> Result<Vec<IndexEntry>> {
    let mut buf = Bytes::from(data);
    let mut index = Vec::new();
    while buf.has_remaining() {
        if buf.remaining() < 4 {
            return Err(StrataError::Corruption("Truncated index entry".to_string()));
        }
        let key_len = buf.get_u32_le() as usize;
        if buf.remaining() < key_len + 12 {
            return Err(StrataError::Corruption("Truncated index entry".to_string()));
        }
        let mut key_bytes = buf.split_to(key_len);
        let key = decode_record(&mut key_bytes)?;
        let offset = buf.get_u64_le();
        let len = buf.get_u32_le();
        let past_end = offset
            .checked_add(len as u64)
            .map_or(true, |end| end > data_end);
        if offset < HEADER_SIZE || past_end {
            return Err(StrataError::Corruption(format!(
                "Index entry out of bounds: offset={} len={}",
                offset, len
            )));
        }
        index.push(IndexEntry { key, offset, len });
    }
    Ok(index)
}

impl StoreFileReader {
    /// Open a store file for reading
    ///
    /// Loads index, bloom filters and file info into memory.
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let mut file = open_source(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(StrataError::Corruption(format!(
                "File too small to be a store file: {} bytes",
                file_size
            )));
        }

        // Read and validate header
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        if &header[0..4] != MAGIC {
            return Err(StrataError::Corruption(format!(
                "Invalid store file magic: expected STRA, got {:?}",
                &header[0..4]
            )));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(StrataError::Corruption(format!(
                "Unsupported store file version: {}",
                version
            )));
        }

        // Read footer
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer_data = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer_data)?;
        let footer = Footer::decode(&footer_data)?;

        let trailer_end = file_size - FOOTER_SIZE;
        for handle in [footer.index, footer.bloom, footer.delete_bloom, footer.info] {
            let past_end = handle
                .offset
                .checked_add(handle.len)
                .map_or(true, |end| end > trailer_end);
            if handle.offset < HEADER_SIZE || past_end {
                return Err(StrataError::Corruption(format!(
                    "Block handle out of bounds: offset={} len={}",
                    handle.offset, handle.len
                )));
            }
        }

        if config.verify_checksums {
            let data = read_block(
                &mut file,
                BlockHandle {
                    offset: HEADER_SIZE,
                    len: footer.index.offset - HEADER_SIZE,
                },
            )?;
            let crc = crc32fast::hash(&data);
            if crc != footer.data_crc {
                return Err(StrataError::Corruption(format!(
                    "Data checksum mismatch in {}: expected {:08x}, got {:08x}",
                    path.display(),
                    footer.data_crc,
                    crc
                )));
            }
        }

        let index = parse_index(read_block(&mut file, footer.index)?, footer.index.offset)?;
        let info: FileInfo = bincode::deserialize(&read_block(&mut file, footer.info)?)?;
        if index.len() as u64 != info.entry_count {
            return Err(StrataError::Corruption(format!(
                "Index has {} entries, file info says {}",
                index.len(),
                info.entry_count
            )));
        }

        let non_empty = |data: Vec<u8>| if data.is_empty() { None } else { Some(data) };
        let general_bloom = non_empty(read_block(&mut file, footer.bloom)?);
        let delete_family_bloom = non_empty(read_block(&mut file, footer.delete_bloom)?);

        tracing::debug!(
            "Opened store file {} ({} entries, seqid={}, bloom={:?}, bulk_loaded={})",
            path.display(),
            info.entry_count,
            info.sequence_id,
            info.bloom_type,
            info.bulk_loaded
        );

        Ok(Self {
            path: path.to_path_buf(),
            file_size,
            policy: BloomFilterPolicy::new(info.bloom_bits_per_key as usize),
            info,
            index,
            general_bloom,
            delete_family_bloom,
            shared: Mutex::new(file),
            entry_cache: Mutex::new(HashMap::new()),
            entry_cache_capacity: config.entry_cache_capacity,
            stream_buffer_size: config.stream_buffer_size,
            compaction_readahead: config.compaction_readahead,
            ref_count: AtomicUsize::new(0),
            primary_replica: AtomicBool::new(true),
        })
    }

    /// Create a new cursor over this file
    pub fn cursor(self: &Arc<Self>, options: CursorOptions) -> SSTableCursor {
        SSTableCursor::new(Arc::clone(self), options)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn entry_count(&self) -> u64 {
        self.info.entry_count
    }

    pub fn max_timestamp(&self) -> u64 {
        self.info.max_timestamp
    }

    pub fn min_timestamp(&self) -> u64 {
        self.info.min_timestamp
    }

    pub fn sequence_id(&self) -> u64 {
        self.info.sequence_id
    }

    pub fn is_bulk_loaded(&self) -> bool {
        self.info.bulk_loaded
    }

    pub fn is_skip_reset_seq_id(&self) -> bool {
        self.info.skip_reset_seq_id
    }

    pub fn has_mvcc_info(&self) -> bool {
        self.info.has_mvcc_info
    }

    pub fn bloom_type(&self) -> BloomType {
        self.info.bloom_type
    }

    pub fn first_row_key(&self) -> Option<&[u8]> {
        self.info.first_row.as_deref()
    }

    pub fn last_row_key(&self) -> Option<&[u8]> {
        self.info.last_row.as_deref()
    }

    /// Row lies within [first_row, last_row]; false for empty files
    fn row_in_range(&self, row: &[u8]) -> bool {
        match (self.first_row_key(), self.last_row_key()) {
            (Some(first), Some(last)) => row >= first && row <= last,
            _ => false,
        }
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Row+qualifier bloom check; always passes unless the file is `RowCol`
    pub fn passes_row_col_bloom_filter(&self, key: &Record) -> bool {
        if self.info.bloom_type != BloomType::RowCol {
            return true;
        }
        if !self.row_in_range(&key.row) {
            return false;
        }
        match &self.general_bloom {
            Some(filter) => self
                .policy
                .may_contain(filter, &row_col_bloom_key(&key.row, &key.qualifier)),
            None => true,
        }
    }

    /// Row bloom check; always passes unless the file is `Row`
    pub fn passes_row_bloom_filter(&self, row: &[u8]) -> bool {
        if self.info.bloom_type != BloomType::Row {
            return true;
        }
        if !self.row_in_range(row) {
            return false;
        }
        match &self.general_bloom {
            Some(filter) => self.policy.may_contain(filter, row),
            None => true,
        }
    }

    /// Could this file hold a family delete marker for `row`?
    pub fn passes_delete_family_bloom_filter(&self, row: &[u8]) -> bool {
        if self.info.delete_family_count == 0 {
            return false;
        }
        match &self.delete_family_bloom {
            Some(filter) => self.policy.may_contain(filter, row),
            None => true,
        }
    }

    /// File timestamps overlap `range` and are not all expired
    pub fn passes_timerange_filter(&self, range: &TimeRange, oldest_unexpired_ts: u64) -> bool {
        range.overlaps_file(self.min_timestamp(), self.max_timestamp())
            && self.max_timestamp() >= oldest_unexpired_ts
    }

    /// File rows overlap the scan's row range
    pub fn passes_key_range_filter(&self, scan: &Scan) -> bool {
        let (Some(first), Some(last)) = (self.first_row_key(), self.last_row_key()) else {
            return false;
        };
        let (smallest, largest) = if scan.is_reversed() {
            (scan.stop_row(), scan.start_row())
        } else {
            (scan.start_row(), scan.stop_row())
        };
        // An empty upper bound is unbounded
        let non_overlapping = (!largest.is_empty() && first > largest) || last < smallest;
        !non_overlapping
    }

    /// General bloom check for get scans
    ///
    /// `RowCol` files are only checked when exactly one column is requested;
    /// multi-column gets rely on the per-column checks in lazy seeks.
    pub fn passes_bloom_filter(&self, scan: &Scan, columns: Option<&BTreeSet<Bytes>>) -> bool {
        if !scan.is_get_scan() {
            return true;
        }
        let row = scan.start_row();
        match self.info.bloom_type {
            BloomType::Row => self.passes_row_bloom_filter(row),
            BloomType::RowCol => match columns {
                Some(columns) if columns.len() == 1 => {
                    let qualifier = columns.first().cloned().unwrap_or_default();
                    let key = Record::first_on_row_col(
                        Bytes::copy_from_slice(row),
                        Bytes::new(),
                        qualifier,
                    );
                    self.passes_row_col_bloom_filter(&key)
                }
                _ => true,
            },
            BloomType::None => true,
        }
    }

    // =========================================================================
    // Reference Counting
    // =========================================================================

    pub fn increment_ref_count(&self) {
        self.ref_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Release one reference; returns the remaining count
    pub fn decrement_ref_count(&self) -> usize {
        let previous = self.ref_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "ref count underflow on {}", self.path.display());
        previous.saturating_sub(1)
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    pub fn set_primary_replica(&self, primary: bool) {
        self.primary_replica.store(primary, Ordering::Relaxed);
    }

    pub fn is_primary_replica(&self) -> bool {
        self.primary_replica.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Crate-internal access for cursors
    // =========================================================================

    pub(crate) fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub(crate) fn stream_buffer_size(&self, compaction: bool) -> usize {
        if compaction {
            self.compaction_readahead
        } else {
            self.stream_buffer_size
        }
    }

    /// Positional read through the shared handle
    pub(crate) fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        let mut file = self.shared.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; len];
        file.read_exact(&mut data)?;
        Ok(Bytes::from(data))
    }

    pub(crate) fn cached_entry(&self, offset: u64) -> Option<Record> {
        self.entry_cache.lock().get(&offset).cloned()
    }

    pub(crate) fn cache_entry(&self, offset: u64, record: &Record) {
        let mut cache = self.entry_cache.lock();
        if cache.len() < self.entry_cache_capacity {
            cache.insert(offset, record.clone());
        }
    }

    /// Number of memoized entries
    pub fn cached_entries(&self) -> usize {
        self.entry_cache.lock().len()
    }
}

//! SSTable Builder
//!
//! Writes records, already in record order, to a new store file.

use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};

use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::filter::{row_col_bloom_key, BloomFilterPolicy, BloomType, FilterPolicy};
use crate::record::{compare_records, encode_record, Record};

use super::{BlockHandle, FileInfo, Footer, StoreFileMeta, ENTRY_PREFIX, HEADER_SIZE, MAGIC, VERSION};

/// Per-file write options
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub bloom_type: BloomType,
    pub bloom_bits_per_key: usize,
    /// Sequence id assigned to a bulk-loaded file
    pub bulk_load_sequence: Option<u64>,
    /// Bulk-loaded records keep their own sequences
    pub skip_reset_seq_id: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            bloom_type: BloomType::Row,
            bloom_bits_per_key: 10,
            bulk_load_sequence: None,
            skip_reset_seq_id: false,
        }
    }
}

impl BuildOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bloom_type: config.bloom_type,
            bloom_bits_per_key: config.bloom_bits_per_key,
            bulk_load_sequence: None,
            skip_reset_seq_id: false,
        }
    }

    pub fn bloom_type(mut self, bloom_type: BloomType) -> Self {
        self.bloom_type = bloom_type;
        self
    }

    /// Mark the file bulk loaded with the given sequence id
    pub fn bulk_load(mut self, sequence_id: u64) -> Self {
        self.bulk_load_sequence = Some(sequence_id);
        self
    }

    pub fn skip_reset_seq_id(mut self, skip: bool) -> Self {
        self.skip_reset_seq_id = skip;
        self
    }
}

/// Builder for creating new store files from sorted records
pub struct SSTableBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    options: BuildOptions,
    /// Current write position (for index)
    current_offset: u64,
    /// Encoded index block, built as entries are written
    index: BytesMut,
    /// Previous record key, for order validation
    last_key: Option<Record>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
    // File info accumulators
    entry_count: u64,
    min_timestamp: u64,
    max_timestamp: u64,
    max_sequence: u64,
    delete_family_count: u64,
    first_row: Option<Vec<u8>>,
    // Bloom keys, deduplicated against the previous key
    bloom_keys: Vec<Vec<u8>>,
    delete_family_rows: Vec<Vec<u8>>,
    scratch: BytesMut,
}

impl SSTableBuilder {
    /// Create a new store file builder
    ///
    /// Writes header immediately; call `add()` in record order, then
    /// `finish()` to write index, blooms, file info and footer.
    pub fn new(path: &Path, options: BuildOptions) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            options,
            current_offset: HEADER_SIZE,
            index: BytesMut::new(),
            last_key: None,
            data_hasher: crc32fast::Hasher::new(),
            entry_count: 0,
            min_timestamp: u64::MAX,
            max_timestamp: 0,
            max_sequence: 0,
            delete_family_count: 0,
            first_row: None,
            bloom_keys: Vec::new(),
            delete_family_rows: Vec::new(),
            scratch: BytesMut::new(),
        })
    }

    /// Append a record (must be strictly after the previous one)
    pub fn add(&mut self, record: &Record) -> Result<()> {
        if let Some(last) = &self.last_key {
            if compare_records(last, record) != Ordering::Less {
                return Err(StrataError::InvalidArgument(format!(
                    "Records out of order: {} after {}",
                    record, last
                )));
            }
        }

        // Encode entry: [len u32][record]
        self.scratch.clear();
        self.scratch.put_u32_le(0);
        encode_record(record, &mut self.scratch)?;
        let record_len = (self.scratch.len() - ENTRY_PREFIX) as u32;
        self.scratch[..ENTRY_PREFIX].copy_from_slice(&record_len.to_le_bytes());

        self.writer.write_all(&self.scratch)?;
        self.data_hasher.update(&self.scratch);

        // Index entry: [key_len u32][key-only record][offset u64][entry_len u32]
        let key = record.key_only();
        let key_start = self.index.len();
        self.index.put_u32_le(0);
        encode_record(&key, &mut self.index)?;
        let key_len = (self.index.len() - key_start - 4) as u32;
        self.index[key_start..key_start + 4].copy_from_slice(&key_len.to_le_bytes());
        self.index.put_u64_le(self.current_offset);
        self.index.put_u32_le(self.scratch.len() as u32);

        self.current_offset += self.scratch.len() as u64;
        self.track(record);
        self.last_key = Some(key);
        Ok(())
    }

    /// Update file info accumulators and bloom keys
    fn track(&mut self, record: &Record) {
        self.entry_count += 1;
        self.min_timestamp = self.min_timestamp.min(record.timestamp);
        self.max_timestamp = self.max_timestamp.max(record.timestamp);
        self.max_sequence = self.max_sequence.max(record.sequence);
        if self.first_row.is_none() {
            self.first_row = Some(record.row.to_vec());
        }

        let bloom_key = match self.options.bloom_type {
            BloomType::None => None,
            BloomType::Row => Some(record.row.to_vec()),
            BloomType::RowCol => Some(row_col_bloom_key(&record.row, &record.qualifier)),
        };
        if let Some(key) = bloom_key {
            if self.bloom_keys.last() != Some(&key) {
                self.bloom_keys.push(key);
            }
        }

        if record.record_type.is_delete_family() {
            self.delete_family_count += 1;
            if self.delete_family_rows.last().map(|r| r.as_slice()) != Some(&record.row[..]) {
                self.delete_family_rows.push(record.row.to_vec());
            }
        }
    }

    fn write_block(&mut self, data: &[u8]) -> Result<BlockHandle> {
        let handle = BlockHandle {
            offset: self.current_offset,
            len: data.len() as u64,
        };
        self.writer.write_all(data)?;
        self.current_offset += data.len() as u64;
        Ok(handle)
    }

    /// Finish building: write trailing blocks and footer, return metadata
    pub fn finish(mut self) -> Result<StoreFileMeta> {
        let policy = BloomFilterPolicy::new(self.options.bloom_bits_per_key);

        let index = std::mem::take(&mut self.index);
        let index_handle = self.write_block(&index)?;

        let bloom = if self.options.bloom_type == BloomType::None || self.entry_count == 0 {
            Vec::new()
        } else {
            policy.create_filter(&self.bloom_keys)
        };
        let bloom_handle = self.write_block(&bloom)?;

        let delete_bloom = if self.delete_family_rows.is_empty() {
            Vec::new()
        } else {
            policy.create_filter(&self.delete_family_rows)
        };
        let delete_bloom_handle = self.write_block(&delete_bloom)?;

        let bulk_loaded = self.options.bulk_load_sequence.is_some();
        let info = FileInfo {
            entry_count: self.entry_count,
            min_timestamp: self.min_timestamp,
            max_timestamp: self.max_timestamp,
            sequence_id: self.options.bulk_load_sequence.unwrap_or(self.max_sequence),
            bulk_loaded,
            skip_reset_seq_id: bulk_loaded && self.options.skip_reset_seq_id,
            has_mvcc_info: !bulk_loaded && self.max_sequence > 0,
            bloom_type: self.options.bloom_type,
            bloom_bits_per_key: self.options.bloom_bits_per_key as u32,
            delete_family_count: self.delete_family_count,
            first_row: self.first_row.take(),
            last_row: self.last_key.as_ref().map(|k| k.row.to_vec()),
            created_at_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        };
        let info_bytes = bincode::serialize(&info)?;
        let info_handle = self.write_block(&info_bytes)?;

        let footer = Footer {
            index: index_handle,
            bloom: bloom_handle,
            delete_bloom: delete_bloom_handle,
            info: info_handle,
            data_crc: self.data_hasher.clone().finalize(),
        };
        self.writer.write_all(&footer.encode())?;
        self.writer.flush()?;

        let file = self.writer.into_inner().map_err(|e| {
            StrataError::Storage(format!("Failed to flush store file: {}", e))
        })?;
        file.sync_all()?;
        let file_size = file.metadata()?.len();

        tracing::debug!(
            "Wrote store file {} ({} entries, {} bytes, seqid={})",
            self.path.display(),
            info.entry_count,
            file_size,
            info.sequence_id
        );

        Ok(StoreFileMeta {
            path: self.path,
            file_size,
            info,
        })
    }
}

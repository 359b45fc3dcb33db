//! SSTable Cursor
//!
//! Seekable position over the entries of one store file. This is the
//! low-level capability record scanners are built on.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::error::{Result, StrataError};
use crate::record::{compare_keys, decode_record, Record};

use super::reader::{open_source, StoreFileReader};
use super::ENTRY_PREFIX;

/// Outcome of positioning a cursor relative to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekResult {
    /// The key precedes the first entry; the cursor is not positioned
    BeforeFirst,
    /// The cursor is on an entry at or after the key
    AtOrAfter,
    /// The cursor is on the last entry before the key
    Before,
}

/// Cursor over the sorted entries of a store file
pub trait FileCursor: Send {
    /// Position on the last entry <= `key`
    fn seek_to(&mut self, key: &Record) -> Result<SeekResult>;

    /// Like `seek_to`, but only ever moves forward from the current entry
    fn reseek_to(&mut self, key: &Record) -> Result<SeekResult>;

    /// Position on the first entry; false for an empty file
    fn seek_to_first(&mut self) -> Result<bool>;

    /// Position on the last entry strictly before `key`
    fn seek_before(&mut self, key: &Record) -> Result<bool>;

    /// Advance one entry; false (and unpositioned) past the end
    fn next(&mut self) -> Result<bool>;

    /// Entry under the cursor
    fn current(&self) -> Option<&Record>;

    fn is_seeked(&self) -> bool;

    /// Release any file handles held by the cursor
    fn close(&mut self);
}

/// How a cursor reads its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorOptions {
    /// Consult and populate the reader's entry cache
    pub cache_blocks: bool,
    /// Read through the reader's shared handle instead of a private stream
    pub use_pread: bool,
    /// Compaction read: large readahead, no cache population
    pub compaction: bool,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            cache_blocks: true,
            use_pread: true,
            compaction: false,
        }
    }
}

/// Private buffered stream over the file
struct Stream {
    reader: BufReader<File>,
    /// Logical stream position; `u64::MAX` when unknown
    offset: u64,
}

impl Stream {
    fn read(&mut self, offset: u64, len: usize) -> Result<Bytes> {
        if self.offset != offset {
            self.reader.seek(SeekFrom::Start(offset))?;
        }
        self.offset = u64::MAX;
        let mut data = vec![0u8; len];
        self.reader.read_exact(&mut data)?;
        self.offset = offset + len as u64;
        Ok(Bytes::from(data))
    }
}

/// Cursor over a [`StoreFileReader`]
pub struct SSTableCursor {
    reader: Arc<StoreFileReader>,
    options: CursorOptions,
    stream: Option<Stream>,
    position: Option<usize>,
    current: Option<Record>,
}

impl SSTableCursor {
    pub(crate) fn new(reader: Arc<StoreFileReader>, options: CursorOptions) -> Self {
        Self {
            reader,
            options,
            stream: None,
            position: None,
            current: None,
        }
    }

    pub fn options(&self) -> CursorOptions {
        self.options
    }

    fn len(&self) -> usize {
        self.reader.index().len()
    }

    fn key_at(&self, pos: usize) -> &Record {
        &self.reader.index()[pos].key
    }

    /// First position in `from..` whose key is >= `key`
    fn lower_bound(&self, key: &Record, from: usize) -> usize {
        let index = &self.reader.index()[from..];
        from + index.partition_point(|e| compare_keys(&e.key, key) == Ordering::Less)
    }

    fn unposition(&mut self) {
        self.position = None;
        self.current = None;
    }

    /// Classify lower bound `p` and position accordingly
    fn position_around(&mut self, key: &Record, p: usize) -> Result<SeekResult> {
        if p < self.len() && compare_keys(self.key_at(p), key) == Ordering::Equal {
            self.load(p)?;
            return Ok(SeekResult::AtOrAfter);
        }
        if p == 0 {
            self.unposition();
            return Ok(SeekResult::BeforeFirst);
        }
        self.load(p - 1)?;
        Ok(SeekResult::Before)
    }

    fn load(&mut self, pos: usize) -> Result<()> {
        let (offset, len) = {
            let entry = &self.reader.index()[pos];
            (entry.offset, entry.len as usize)
        };
        let use_cache = self.options.cache_blocks && !self.options.compaction;

        let cached = if use_cache {
            self.reader.cached_entry(offset)
        } else {
            None
        };
        let record = match cached {
            Some(record) => record,
            None => {
                let data = self.read_entry(offset, len)?;
                let record = Self::decode_entry(data)?;
                if use_cache {
                    self.reader.cache_entry(offset, &record);
                }
                record
            }
        };

        self.position = Some(pos);
        self.current = Some(record);
        Ok(())
    }

    fn read_entry(&mut self, offset: u64, len: usize) -> Result<Bytes> {
        if self.options.use_pread {
            return self.reader.read_at(offset, len);
        }
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                let file = open_source(self.reader.path())?;
                let capacity = self.reader.stream_buffer_size(self.options.compaction);
                Stream {
                    reader: BufReader::with_capacity(capacity, file),
                    offset: 0,
                }
            }
        };
        self.stream.insert(stream).read(offset, len)
    }

    fn decode_entry(mut data: Bytes) -> Result<Record> {
        if data.len() < ENTRY_PREFIX {
            return Err(StrataError::Corruption("Truncated data entry".to_string()));
        }
        let record_len = data.get_u32_le() as usize;
        if record_len != data.len() {
            return Err(StrataError::Corruption(format!(
                "Entry length mismatch: header says {}, index says {}",
                record_len,
                data.len()
            )));
        }
        decode_record(&mut data)
    }
}

impl FileCursor for SSTableCursor {
    fn seek_to(&mut self, key: &Record) -> Result<SeekResult> {
        let p = self.lower_bound(key, 0);
        self.position_around(key, p)
    }

    fn reseek_to(&mut self, key: &Record) -> Result<SeekResult> {
        let Some(pos) = self.position else {
            return self.seek_to(key);
        };
        if compare_keys(key, self.key_at(pos)) != Ordering::Greater {
            // Already at or after the key
            return Ok(SeekResult::AtOrAfter);
        }
        let p = self.lower_bound(key, pos);
        self.position_around(key, p)
    }

    fn seek_to_first(&mut self) -> Result<bool> {
        if self.len() == 0 {
            self.unposition();
            return Ok(false);
        }
        self.load(0)?;
        Ok(true)
    }

    fn seek_before(&mut self, key: &Record) -> Result<bool> {
        let p = self.lower_bound(key, 0);
        if p == 0 {
            return Ok(false);
        }
        self.load(p - 1)?;
        Ok(true)
    }

    fn next(&mut self) -> Result<bool> {
        let Some(pos) = self.position else {
            return Ok(false);
        };
        if pos + 1 >= self.len() {
            self.unposition();
            return Ok(false);
        }
        self.load(pos + 1)?;
        Ok(true)
    }

    fn current(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    fn is_seeked(&self) -> bool {
        self.position.is_some()
    }

    fn close(&mut self) {
        self.stream = None;
        self.unposition();
    }
}

//! Configuration for strata
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, StrataError};
use crate::filter::BloomType;

/// Main configuration for a strata store directory
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the store files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── storefile_000001.sst
    ///     └── storefile_000002.sst
    pub data_dir: PathBuf,

    /// Verify the data block CRC when a store file is opened
    pub verify_checksums: bool,

    // -------------------------------------------------------------------------
    // Bloom Filter Configuration
    // -------------------------------------------------------------------------
    /// Bloom filter type written into new store files
    pub bloom_type: BloomType,

    /// Bits per key for new bloom filters (10 gives ~1% false positives)
    pub bloom_bits_per_key: usize,

    // -------------------------------------------------------------------------
    // Read Path Configuration
    // -------------------------------------------------------------------------
    /// Max decoded entries memoized per reader for `cache_blocks` scans
    pub entry_cache_capacity: usize,

    /// Buffer size of a private (non-pread) cursor stream
    pub stream_buffer_size: usize,

    /// Buffer size of a private cursor stream opened for compaction
    pub compaction_readahead: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./strata_data"),
            verify_checksums: true,
            bloom_type: BloomType::Row,
            bloom_bits_per_key: 10,
            entry_cache_capacity: 4096,
            stream_buffer_size: 8 * 1024,          // 8 KB
            compaction_readahead: 1024 * 1024,     // 1 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the read path cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.bloom_type != BloomType::None && self.bloom_bits_per_key == 0 {
            return Err(StrataError::Config(
                "bloom_bits_per_key must be positive when bloom filters are enabled".to_string(),
            ));
        }
        if self.stream_buffer_size == 0 || self.compaction_readahead == 0 {
            return Err(StrataError::Config(
                "stream buffer sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable data checksum verification on open
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    /// Set the bloom filter type for new store files
    pub fn bloom_type(mut self, bloom_type: BloomType) -> Self {
        self.config.bloom_type = bloom_type;
        self
    }

    /// Set bloom filter bits per key
    pub fn bloom_bits_per_key(mut self, bits: usize) -> Self {
        self.config.bloom_bits_per_key = bits;
        self
    }

    /// Set the per-reader decoded entry cache capacity
    pub fn entry_cache_capacity(mut self, entries: usize) -> Self {
        self.config.entry_cache_capacity = entries;
        self
    }

    /// Set the private stream buffer size (in bytes)
    pub fn stream_buffer_size(mut self, bytes: usize) -> Self {
        self.config.stream_buffer_size = bytes;
        self
    }

    /// Set the compaction stream buffer size (in bytes)
    pub fn compaction_readahead(mut self, bytes: usize) -> Self {
        self.config.compaction_readahead = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

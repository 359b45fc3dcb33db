//! Error types for strata
//!
//! Provides a unified error type for all operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Scanner operation that failed, carried by [`StrataError::Scan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOp {
    Iterate,
    Seek,
    Reseek,
    SeekToPreviousRow,
}

impl fmt::Display for ScanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanOp::Iterate => "iterate",
            ScanOp::Seek => "seek",
            ScanOp::Reseek => "reseek",
            ScanOp::SeekToPreviousRow => "seek to previous row",
        };
        f.write_str(name)
    }
}

/// Unified error type for strata operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store file disappeared between open and access.
    /// Never wrapped into [`StrataError::Scan`]; a higher layer decides
    /// whether to retry elsewhere.
    #[error("Store file vanished: {}", path.display())]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Scanner Errors
    // -------------------------------------------------------------------------
    #[error("Could not {op} {scanner} to key {key}: {source}")]
    Scan {
        op: ScanOp,
        scanner: String,
        key: String,
        #[source]
        source: Box<StrataError>,
    },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Store file corruption detected: {0}")]
    Corruption(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrataError {
    /// True if the underlying file is gone (possibly behind scan context)
    pub fn is_source_missing(&self) -> bool {
        match self {
            StrataError::SourceMissing { .. } => true,
            StrataError::Scan { source, .. } => source.is_source_missing(),
            _ => false,
        }
    }
}

impl From<bincode::Error> for StrataError {
    fn from(err: bincode::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

//! # Strata
//!
//! Versioned record scanning over immutable store files:
//! - Multi-version records ordered by row, column, timestamp and sequence
//! - Snapshot reads: records newer than a read point stay hidden
//! - Lazy, bloom-filter-gated seeks that skip files without touching disk
//! - Forward and reverse (previous-row) positioning
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Query / Merge Layer (caller)                 │
//! │          compare_scanners, newest file wins ties             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Scanner Factory                             │
//! │        one RecordScanner per store file, ranked              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Scanner    │          │  Scanner    │
//!   │ (read pt.)  │          │ (read pt.)  │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │   Store files (SSTable + blooms)    │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod filter;
pub mod query;
pub mod storage;
pub mod scanner;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StrataError};
pub use config::Config;
pub use record::{Record, RecordType};
pub use query::{Scan, ScanQueryMatcher, TimeRange};
pub use scanner::{build_scanners, compare_scanners, KeyValueScanner, RecordScanner, ScanOptions};
pub use storage::{StorageManager, StoreFile};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

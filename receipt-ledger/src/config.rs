//! Configuration for the event journal

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// RocksDB journal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Write events through to RocksDB
    pub enabled: bool,

    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,

    /// Records kept in memory; older ones are read back from RocksDB
    pub memory_tail: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_dir: PathBuf::from("./data/journal"),
            write_buffer_size_mb: 64,
            max_background_jobs: 2,
            enable_statistics: false,
            memory_tail: 10_000,
        }
    }
}

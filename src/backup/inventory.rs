use crate::backup::result_error::result::Result;
use crate::backup::size::walk_error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

const DEFAULT_FILES_ABOVE: u64 = 100;
const DEFAULT_BYTES_AT_LEAST: u64 = 100 * 1024 * 1024;

/// File count and byte size of a cloned tree, used to pick the copy strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileInventory {
    pub file_count: u64,
    pub total_bytes: u64,
}

impl FileInventory {
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut inventory = FileInventory::default();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| walk_error(root, e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let md = entry.metadata().map_err(|e| walk_error(entry.path(), e))?;
            inventory.file_count += 1;
            inventory.total_bytes += md.len();
        }
        Ok(inventory)
    }
}

/// Limits above which the parallel re-copy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParallelThreshold {
    /// Parallel copy when the tree holds strictly more files than this.
    #[serde(default = "default_files_above")]
    pub files_above: u64,
    /// Parallel copy when the tree holds at least this many bytes.
    #[serde(default = "default_bytes_at_least")]
    pub bytes_at_least: u64,
}

fn default_files_above() -> u64 {
    DEFAULT_FILES_ABOVE
}

fn default_bytes_at_least() -> u64 {
    DEFAULT_BYTES_AT_LEAST
}

impl Default for ParallelThreshold {
    fn default() -> Self {
        Self {
            files_above: DEFAULT_FILES_ABOVE,
            bytes_at_least: DEFAULT_BYTES_AT_LEAST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// The structural clone is the only copy.
    Sequential,
    /// Files are copied again by a worker pool after the clone.
    Parallel,
}

impl CopyStrategy {
    pub fn select(inventory: &FileInventory, threshold: &ParallelThreshold) -> Self {
        if inventory.file_count > threshold.files_above
            || inventory.total_bytes >= threshold.bytes_at_least
        {
            CopyStrategy::Parallel
        } else {
            CopyStrategy::Sequential
        }
    }
}

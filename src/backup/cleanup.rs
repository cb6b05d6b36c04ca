use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What is removed once the destination has been compressed.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    /// Delete the whole destination directory, the compressed files with it.
    ///
    /// This leaves no backup at all and is kept for compatibility with existing runs.
    #[default]
    WholeTree,
    /// Delete only the originals that received a compressed sibling.
    OriginalsOnly,
}

/// Recursively deletes `path` and everything below it.
pub fn remove_tree<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!("Removing tree {:?}", path);
    fs::remove_dir_all(path).map_err(|source| Error::CleanupFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Deletes each listed file, stopping at the first failure.
///
/// Returns how many files were removed.
pub fn remove_originals<I, P>(originals: I) -> Result<usize>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut removed = 0;
    for path in originals {
        let path = path.as_ref();
        tracing::trace!("Removing original {:?}", path);
        fs::remove_file(path).map_err(|source| Error::CleanupFailure {
            path: path.to_path_buf(),
            source,
        })?;
        removed += 1;
    }
    Ok(removed)
}

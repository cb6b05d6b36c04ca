use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Total byte size of the regular files under a directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectorySizeReport {
    pub total_bytes: u64,
}

/// Outcome of comparing the source tree with the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeComparison {
    pub source: DirectorySizeReport,
    pub destination: DirectorySizeReport,
}

impl SizeComparison {
    /// The backup may proceed unless the source is larger than the destination.
    pub fn fits(&self) -> bool {
        self.source.total_bytes <= self.destination.total_bytes
    }

    pub fn into_result(self) -> Result<Self> {
        if self.fits() {
            Ok(self)
        } else {
            Err(Error::SizeMismatch {
                source_bytes: self.source.total_bytes,
                destination_bytes: self.destination.total_bytes,
            })
        }
    }
}

/// Sums the byte length of every regular file under `path`.
///
/// A path that does not exist has size 0. Any other stat or enumeration failure aborts
/// the whole walk with [`Error::FilesystemAccess`].
pub fn compute_size<P: AsRef<Path>>(path: P) -> Result<DirectorySizeReport> {
    let path = path.as_ref();
    match std::fs::symlink_metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{:?} does not exist, counting as 0 bytes", path);
            return Ok(DirectorySizeReport::default());
        }
        Err(e) => {
            return Err(Error::FilesystemAccess {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }

    let mut total_bytes = 0u64;
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|e| walk_error(path, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let md = entry.metadata().map_err(|e| walk_error(entry.path(), e))?;
        total_bytes += md.len();
    }

    tracing::debug!("{:?} holds {} bytes", path, total_bytes);
    Ok(DirectorySizeReport { total_bytes })
}

/// Computes both tree sizes for the size gate.
///
/// Before the first copy the destination usually does not exist, so any non-empty source
/// is reported as larger.
pub fn compare_sizes<P1: AsRef<Path>, P2: AsRef<Path>>(
    source: P1,
    destination: P2,
) -> Result<SizeComparison> {
    let source = compute_size(source)?;
    let destination = compute_size(destination)?;
    Ok(SizeComparison {
        source,
        destination,
    })
}

pub(crate) fn walk_error(fallback: &Path, e: walkdir::Error) -> Error {
    let path = e.path().unwrap_or(fallback).to_path_buf();
    Error::FilesystemAccess {
        path,
        source: io::Error::from(e),
    }
}

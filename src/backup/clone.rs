use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use filetime::FileTime;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copies a single file with its permission bits and timestamps, overwriting `dst`.
///
/// Returns the number of bytes copied.
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> io::Result<u64> {
    let bytes = fs::copy(src, dst)?;
    preserve_timestamps(&fs::metadata(src)?, dst)?;
    Ok(bytes)
}

fn preserve_timestamps(src_meta: &Metadata, dst: &Path) -> io::Result<()> {
    let mtime = FileTime::from_last_modification_time(src_meta);
    let atime = FileTime::from_last_access_time(src_meta);
    filetime::set_file_times(dst, atime, mtime)
}

/// Structural copy of `source` into a new directory `destination`.
///
/// Every directory (empty ones included) and every file is recreated; symbolic links are
/// followed. Fails with [`Error::DestinationExists`] when `destination` is already present,
/// any other failure is an [`Error::CopyFailure`]. A failed clone may leave a partial tree
/// behind.
pub fn clone_tree<P1: AsRef<Path>, P2: AsRef<Path>>(source: P1, destination: P2) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    match fs::symlink_metadata(destination) {
        Ok(_) => return Err(Error::DestinationExists(destination.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(copy_failure(source, destination, e)),
    }

    let src_meta = fs::metadata(source).map_err(|e| copy_failure(source, destination, e))?;
    if !src_meta.is_dir() {
        return Err(copy_failure(
            source,
            destination,
            io::Error::other("source is not a directory"),
        ));
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| copy_failure(source, parent, e))?;
    }

    tracing::info!("Cloning {:?} into {:?}", source, destination);
    let mut dirs: Vec<(Metadata, PathBuf)> = Vec::new();
    let mut file_count = 0usize;
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            copy_failure(&path, destination, io::Error::from(e))
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| copy_failure(entry.path(), destination, io::Error::other(e)))?;
        let target = if relative.as_os_str().is_empty() {
            destination.to_path_buf()
        } else {
            destination.join(relative)
        };

        if entry.file_type().is_dir() {
            fs::create_dir(&target).map_err(|e| copy_failure(entry.path(), &target, e))?;
            let md = entry
                .metadata()
                .map_err(|e| copy_failure(entry.path(), &target, io::Error::from(e)))?;
            dirs.push((md, target));
        } else {
            tracing::trace!("Copying {:?} -> {:?}", entry.path(), target);
            copy_file_with_metadata(entry.path(), &target)
                .map_err(|e| copy_failure(entry.path(), &target, e))?;
            file_count += 1;
        }
    }

    // Directory metadata goes last, a read-only directory must not block its own contents.
    for (md, dir) in dirs.iter().rev() {
        fs::set_permissions(dir, md.permissions())
            .and_then(|_| preserve_timestamps(md, dir))
            .map_err(|e| copy_failure(source, dir, e))?;
    }

    tracing::debug!(
        "Cloned {} directories and {} files into {:?}",
        dirs.len(),
        file_count,
        destination
    );
    Ok(())
}

fn copy_failure(src: &Path, dst: &Path, source: io::Error) -> Error {
    Error::CopyFailure {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    }
}

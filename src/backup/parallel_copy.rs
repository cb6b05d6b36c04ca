use crate::backup::clone::copy_file_with_metadata;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::{convert_error_vec, Result};
use crate::backup::size::walk_error;
use itertools::Itertools;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Number of copy workers when none is configured.
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// One file to copy from the source tree to its mirrored destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub src: PathBuf,
    pub dst: PathBuf,
}

/// Outcome of a best-effort parallel copy.
#[derive(Debug, Default)]
pub struct CopyReport {
    pub copied: usize,
    pub bytes: u64,
    /// Tasks whose copy failed, the cloned file is left as it was.
    pub failed: Vec<CopyTask>,
    /// Source entries that could not be listed and got no task.
    pub unlisted: usize,
    /// Every listing and copy error, in the order they were seen.
    pub errors: Vec<Error>,
}

impl CopyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.unlisted == 0
    }

    /// Moves the recorded errors out of the report as a single error.
    pub fn take_errors(&mut self) -> Result<()> {
        convert_error_vec(std::mem::take(&mut self.errors))
    }
}

/// Lists a copy task for every regular file under `source`, failing on the first entry
/// that cannot be listed.
pub fn collect_copy_tasks<P1: AsRef<Path>, P2: AsRef<Path>>(
    source: P1,
    destination: P2,
) -> Result<Vec<CopyTask>> {
    let (tasks, errors) = scan_copy_tasks(source.as_ref(), destination.as_ref());
    convert_error_vec(errors)?;
    Ok(tasks)
}

fn scan_copy_tasks(source: &Path, destination: &Path) -> (Vec<CopyTask>, Vec<Error>) {
    WalkDir::new(source)
        .follow_links(true)
        .into_iter()
        .filter_map(|res| match res {
            Ok(de) if de.file_type().is_file() => Some(Ok(de.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(walk_error(source, e))),
        })
        .map(|res| {
            res.and_then(|src| {
                let relative = src.strip_prefix(source).map_err(|e| Error::CopyFailure {
                    src: src.clone(),
                    dst: destination.to_path_buf(),
                    source: std::io::Error::other(e),
                })?;
                let dst = destination.join(relative);
                Ok(CopyTask { src, dst })
            })
        })
        .partition_result()
}

/// Copies every file of `source` over its counterpart in `destination` with
/// `worker_count` workers.
pub fn copy_tree<P1: AsRef<Path>, P2: AsRef<Path>>(
    source: P1,
    destination: P2,
    worker_count: usize,
) -> Result<CopyReport> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(worker_count.max(1))
        .thread_name(|i| format!("backup-copy-{i}"))
        .build()?;
    Ok(copy_tree_in(&pool, source, destination))
}

/// Same as [`copy_tree`] on a caller supplied pool.
///
/// Blocks until every task has finished. Entries of `source` that cannot be listed and
/// failed file copies are logged and recorded in the report, they never stop the other
/// tasks.
pub fn copy_tree_in<P1: AsRef<Path>, P2: AsRef<Path>>(
    pool: &ThreadPool,
    source: P1,
    destination: P2,
) -> CopyReport {
    let (tasks, scan_errors) = scan_copy_tasks(source.as_ref(), destination.as_ref());
    for e in &scan_errors {
        tracing::warn!("Skipping source entry: {e}");
    }
    tracing::info!(
        "Copying {} files with {} workers",
        tasks.len(),
        pool.current_num_threads()
    );

    let span = tracing::Span::current();
    let results: Vec<(CopyTask, Result<u64>)> = pool.install(|| {
        tasks
            .into_par_iter()
            .map(|task| {
                let _entered = span.enter();
                let res = copy_one(&task);
                (task, res)
            })
            .collect()
    });

    let mut report = CopyReport {
        unlisted: scan_errors.len(),
        errors: scan_errors,
        ..CopyReport::default()
    };
    for (task, res) in results {
        match res {
            Ok(bytes) => {
                report.copied += 1;
                report.bytes += bytes;
            }
            Err(e) => {
                report.failed.push(task);
                report.errors.push(e);
            }
        }
    }
    report
}

fn copy_one(task: &CopyTask) -> Result<u64> {
    tracing::trace!("Copying {:?} -> {:?}", task.src, task.dst);
    copy_file_with_metadata(&task.src, &task.dst).map_err(|e| {
        let error = Error::CopyFailure {
            src: task.src.clone(),
            dst: task.dst.clone(),
            source: e,
        };
        tracing::error!("{error}");
        error
    })
}

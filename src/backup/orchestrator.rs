//! Sequencing of a single backup run.
//!
//! ```text
//! Idle -> SizeChecked? -> Cloned -> Copied? -> Compressed? -> CleanedUp? -> Done
//! ```
//!
//! Any fatal step moves the run to `Failed`, the report keeps the error that caused it.

use crate::backup::backup_job::BackupJob;
use crate::backup::cleanup::{remove_originals, remove_tree, CleanupMode};
use crate::backup::clone::clone_tree;
use crate::backup::compress::{compress_tree, CompressReport};
use crate::backup::inventory::{CopyStrategy, FileInventory};
use crate::backup::parallel_copy::{copy_tree, CopyReport};
use crate::backup::result_error::error::{BackupErrorKind, Error};
use crate::backup::result_error::result::Result;
use crate::backup::size::compare_sizes;
use getset::Getters;
use tracing::{error, info, info_span, warn, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    Idle,
    SizeChecked,
    Cloned,
    Copied,
    Compressed,
    CleanedUp,
    Done,
    Failed(BackupErrorKind),
}

/// Everything a run produced, up to the step that failed if one did.
#[derive(Debug, Default)]
pub struct BackupReport {
    /// Every state the run went through, in order.
    pub states: Vec<BackupState>,
    pub inventory: Option<FileInventory>,
    pub strategy: Option<CopyStrategy>,
    pub copy: Option<CopyReport>,
    pub compressed: Option<CompressReport>,
    /// Set when the run ended in [`BackupState::Failed`].
    pub error: Option<Error>,
}

impl BackupReport {
    fn transition(&mut self, state: BackupState) {
        tracing::debug!("Backup state {:?} -> {:?}", self.states.last(), state);
        self.states.push(state);
    }

    pub fn final_state(&self) -> Option<BackupState> {
        self.states.last().copied()
    }

    pub fn is_success(&self) -> bool {
        self.final_state() == Some(BackupState::Done)
    }

    /// Splits off the error of a failed run.
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// Runs a [`BackupJob`], emitting every log line inside the span it was given.
#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct BackupOrchestrator {
    job: BackupJob,
    span: Span,
}

impl BackupOrchestrator {
    pub fn new(job: BackupJob) -> Self {
        let span = info_span!(
            "backup",
            source = ?job.source_path(),
            destination = ?job.destination_path()
        );
        Self::with_span(job, span)
    }

    pub fn with_span(job: BackupJob, span: Span) -> Self {
        Self { job, span }
    }

    /// Logs the outcome and reports success as a boolean.
    pub fn backup(&self) -> bool {
        let report = self.execute();
        if let Some(e) = &report.error {
            let _entered = self.span.enter();
            error!("Backup failed ({}): {e}", e.kind());
        }
        report.is_success()
    }

    pub fn run(&self) -> Result<BackupReport> {
        self.execute().into_result()
    }

    /// Runs every step and returns the report, a failed run included.
    pub fn execute(&self) -> BackupReport {
        let _entered = self.span.enter();
        let mut report = BackupReport::default();
        report.transition(BackupState::Idle);

        match self.run_steps(&mut report) {
            Ok(()) => report.transition(BackupState::Done),
            Err(e) => {
                report.transition(BackupState::Failed(e.kind()));
                report.error = Some(e);
            }
        }
        report
    }

    fn run_steps(&self, report: &mut BackupReport) -> Result<()> {
        let job = &self.job;
        let source = job.source_path();
        let destination = job.destination_path();

        if job.compare_size_first() {
            info!("Comparing folder sizes");
            let comparison = compare_sizes(source, destination)?;
            if !comparison.fits() {
                warn!(
                    "Source folder is larger than target folder: {} > {} bytes",
                    comparison.source.total_bytes, comparison.destination.total_bytes
                );
            }
            comparison.into_result()?;
            report.transition(BackupState::SizeChecked);
        }

        clone_tree(source, destination)?;
        info!("Backup completed.");
        report.transition(BackupState::Cloned);

        let inventory = FileInventory::scan(destination)?;
        let strategy = CopyStrategy::select(&inventory, &job.parallel_threshold());
        tracing::debug!(
            "{} files, {} bytes cloned, using {:?} copy",
            inventory.file_count,
            inventory.total_bytes,
            strategy
        );
        report.inventory = Some(inventory);
        report.strategy = Some(strategy);

        match strategy {
            CopyStrategy::Parallel => {
                let mut copy = copy_tree(source, destination, job.worker_count())?;
                if let Err(e) = copy.take_errors() {
                    warn!(
                        "{} of {} files could not be copied again and {} entries could not be \
                         listed, the cloned copies stay:\n{e}",
                        copy.failed.len(),
                        copy.failed.len() + copy.copied,
                        copy.unlisted
                    );
                }
                info!("File copy completed (using multithreading).");
                report.copy = Some(copy);
                report.transition(BackupState::Copied);
            }
            CopyStrategy::Sequential => info!("File copy completed (using single-threading)."),
        }

        if !job.compress() {
            info!("Backup completed without compression.");
            return Ok(());
        }

        let compressed = compress_tree(destination, job.compressor())?;
        info!("Compression complete.");
        report.transition(BackupState::Compressed);

        if job.remove_unzipped_after_compress() {
            match job.cleanup() {
                CleanupMode::WholeTree => {
                    warn!(
                        "Removing {:?} entirely, its {} compressed files included",
                        destination,
                        compressed.compressed.len()
                    );
                    remove_tree(destination)?;
                }
                CleanupMode::OriginalsOnly => {
                    let removed = remove_originals(&compressed.originals)?;
                    tracing::debug!("Removed {} uncompressed originals", removed);
                }
            }
            info!("Unzipped folder removed.");
            report.transition(BackupState::CleanedUp);
        }
        report.compressed = Some(compressed);

        Ok(())
    }
}

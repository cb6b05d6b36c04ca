//! # tree-backup
//!
//! Copies a directory tree to a new destination, optionally compressing the copy.
//!
//! ## Features
//!
//! - **Size Gate**: Refuse to start when the source is larger than the destination
//! - **Structural Clone**: Directories, files, permissions and timestamps
//! - **Parallel Copy**: Large trees are copied again by a fixed worker pool
//! - **Compression**: A gzip sibling for every file of the copy
//! - **Cleanup**: Remove the uncompressed copy after compression
//!
//! ## Quick Start
//!
//! ```no_run
//! use tree_backup::backup::backup_job::BackupJob;
//! use tree_backup::backup::orchestrator::BackupOrchestrator;
//!
//! let job = BackupJob::builder()
//!     .source_path("/home/me/documents")
//!     .destination_path("/mnt/backup/documents")
//!     .compress(true)
//!     .build();
//!
//! let report = BackupOrchestrator::new(job).run()?;
//! println!("Finished in state {:?}", report.final_state());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Note that enabling both `compress` and `remove_unzipped_after_compress` with the
//! default cleanup mode deletes the whole destination, compressed files included.
//! Use [`CleanupMode::OriginalsOnly`](backup::cleanup::CleanupMode::OriginalsOnly)
//! to keep the compressed files.

pub mod backup;

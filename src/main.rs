use clap::Parser;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;
use tree_backup::backup::backup_job::BackupJob;
use tree_backup::backup::cleanup::CleanupMode;
use tree_backup::backup::orchestrator::BackupOrchestrator;
use tree_backup::backup::parallel_copy::DEFAULT_WORKER_COUNT;
use tree_backup::backup::result_error::error::Error;
use tree_backup::backup::result_error::result::Result;
use tree_backup::backup::result_error::WithMsg;
use validator::Validate;

/// Copy a folder to a new location, optionally compressing the copy
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory to back up
    #[arg(required_unless_present = "config")]
    source: Option<PathBuf>,

    /// Where the copy goes, must not exist yet
    #[arg(required_unless_present = "config")]
    destination: Option<PathBuf>,

    /// Read the whole job from a YAML file instead
    #[arg(short, long, conflicts_with_all = ["source", "destination"])]
    config: Option<PathBuf>,

    /// Remove the uncompressed folder after compressing it
    #[arg(long)]
    remove_unzipped: bool,

    /// Compress every copied file with gzip
    #[arg(short, long)]
    zip: bool,

    /// Check that the destination is at least as large as the source first
    #[arg(long)]
    compare_size: bool,

    /// Only remove the uncompressed originals, keep the .gz files
    #[arg(long, requires = "remove_unzipped")]
    keep_compressed: bool,

    /// Worker threads for the parallel copy
    #[arg(short = 'j', long, default_value_t = DEFAULT_WORKER_COUNT)]
    workers: usize,
}

impl Args {
    fn into_job(self) -> Result<BackupJob> {
        if let Some(config) = self.config {
            return BackupJob::from_yaml_file(config);
        }

        let (Some(source), Some(destination)) = (self.source, self.destination) else {
            return Err(Error::from(std::io::Error::other(
                "source and destination are required",
            )));
        };
        let cleanup = if self.keep_compressed {
            CleanupMode::OriginalsOnly
        } else {
            CleanupMode::WholeTree
        };
        let job = BackupJob::builder()
            .source_path(source)
            .destination_path(destination)
            .remove_unzipped_after_compress(self.remove_unzipped)
            .compress(self.zip)
            .compare_size_first(self.compare_size)
            .worker_count(self.workers)
            .cleanup(cleanup)
            .build();
        job.validate()
            .map_err(Error::from)
            .with_msg("Invalid arguments")?;
        Ok(job)
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let ok = match args.into_job() {
        Ok(job) => BackupOrchestrator::new(job).backup(),
        Err(e) => {
            error!("{e}");
            false
        }
    };

    exit(if ok { 0 } else { 1 });
}

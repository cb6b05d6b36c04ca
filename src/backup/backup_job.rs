use crate::backup::cleanup::CleanupMode;
use crate::backup::compress::CompressorConfig;
use crate::backup::inventory::ParallelThreshold;
use crate::backup::parallel_copy::DEFAULT_WORKER_COUNT;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::{validate_destination_outside_source, validate_dir_exist};
use bon::Builder;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

/// One backup run: what to copy, where to, and which optional steps to take.
///
/// Built once per invocation and never mutated afterwards.
#[derive(
    Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters, CopyGetters,
)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = validate_job_paths))]
pub struct BackupJob {
    #[validate(custom(function = validate_dir_exist))]
    #[builder(into)]
    #[getset(get = "pub")]
    source_path: PathBuf,

    /// Must not exist yet, the backup never merges into an existing tree.
    #[builder(into)]
    #[getset(get = "pub")]
    destination_path: PathBuf,

    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    remove_unzipped_after_compress: bool,

    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    compress: bool,

    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    compare_size_first: bool,

    #[serde(default = "default_worker_count")]
    #[builder(default = DEFAULT_WORKER_COUNT)]
    #[validate(range(min = 1))]
    #[getset(get_copy = "pub")]
    worker_count: usize,

    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    parallel_threshold: ParallelThreshold,

    #[serde(default)]
    #[builder(default)]
    #[validate(nested)]
    #[getset(get = "pub")]
    compressor: CompressorConfig,

    #[serde(default)]
    #[builder(default)]
    #[getset(get_copy = "pub")]
    cleanup: CleanupMode,
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn validate_job_paths(job: &BackupJob) -> std::result::Result<(), ValidationError> {
    validate_destination_outside_source(&job.source_path, &job.destination_path)
}

impl BackupJob {
    /// Reads and validates a job from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let job: BackupJob = File::open(path)
            .map_err(Error::from)
            .and_then(|f| serde_yml::from_reader(f).map_err(Error::from))
            .with_msg(format!("Parse YAML config failed: {:?}", path))?;
        job.validate()
            .map_err(Error::from)
            .with_msg(format!("Config validation failed: {:?}", path))?;
        Ok(job)
    }
}

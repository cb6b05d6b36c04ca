use crate::backup::result_error::{WithDebugObjectAndFnName, WithMsg};
use derive_more::Display;
use itertools::Itertools;
use std::fmt::Debug;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Destination already exists: {0:?}")]
    DestinationExists(PathBuf),
    #[error("Cannot access {path:?}: {source}")]
    FilesystemAccess { path: PathBuf, source: io::Error },
    #[error("Copy {src:?} -> {dst:?} failed: {source}")]
    CopyFailure {
        src: PathBuf,
        dst: PathBuf,
        source: io::Error,
    },
    #[error("Compress {path:?} failed: {source}")]
    CompressionFailure { path: PathBuf, source: io::Error },
    #[error("Remove {path:?} failed: {source}")]
    CleanupFailure { path: PathBuf, source: io::Error },
    #[error("Source is larger than destination: {source_bytes} > {destination_bytes} bytes")]
    SizeMismatch {
        source_bytes: u64,
        destination_bytes: u64,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    ThreadPoolBuildError(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{:?} {} failed:\n{}", obj_debug, fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithDebugObjAndFnName {
        error: Box<Error>,
        obj_debug: Box<dyn Debug + Send>,
        fn_name: String,
    },
    #[error("{}", itertools::join(.0, "\n\n"))]
    LotsOfError(Vec<Error>),
}

/// Classification of a failed backup run.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupErrorKind {
    #[display("DestinationExists")]
    DestinationExists,
    #[display("FilesystemAccess")]
    FilesystemAccess,
    #[display("CopyFailure")]
    CopyFailure,
    #[display("CompressionFailure")]
    CompressionFailure,
    #[display("CleanupFailure")]
    CleanupFailure,
    #[display("SizeMismatch")]
    SizeMismatch,
    #[display("InvalidConfig")]
    InvalidConfig,
    #[display("Other")]
    Other,
}

impl<S: Into<String>, O: Debug + Send + 'static> WithDebugObjectAndFnName<S, O> for Error {
    fn with_debug_object_and_fn_name(self, obj: O, fn_name: S) -> Self {
        Error::WithDebugObjAndFnName {
            error: Box::new(self),
            obj_debug: Box::new(obj),
            fn_name: fn_name.into(),
        }
    }
}

impl<S: Into<String>> WithMsg<S> for Error {
    fn with_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl From<Vec<Error>> for Error {
    fn from(errors: Vec<Error>) -> Self {
        Self::LotsOfError(errors.into_iter().flat_map(|e| e.into_iter()).collect_vec())
    }
}

impl Error {
    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(|e| e.into_iter())),
            e => Box::new(std::iter::once(e)),
        }
    }

    /// Classification of the error, looking through message and context wrappers.
    ///
    /// A [`Error::LotsOfError`] is classified by its first error.
    pub fn kind(&self) -> BackupErrorKind {
        match self {
            Error::DestinationExists(_) => BackupErrorKind::DestinationExists,
            Error::FilesystemAccess { .. } => BackupErrorKind::FilesystemAccess,
            Error::CopyFailure { .. } => BackupErrorKind::CopyFailure,
            Error::CompressionFailure { .. } => BackupErrorKind::CompressionFailure,
            Error::CleanupFailure { .. } => BackupErrorKind::CleanupFailure,
            Error::SizeMismatch { .. } => BackupErrorKind::SizeMismatch,
            Error::ValidationError(_) | Error::SerdeYml(_) => BackupErrorKind::InvalidConfig,
            Error::Io(_) | Error::ThreadPoolBuildError(_) => BackupErrorKind::Other,
            Error::WithMsg { error, .. } | Error::WithDebugObjAndFnName { error, .. } => {
                error.kind()
            }
            Error::LotsOfError(v) => v
                .first()
                .map(Error::kind)
                .unwrap_or(BackupErrorKind::Other),
        }
    }
}

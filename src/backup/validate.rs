//! Validation functions for configuration values.
//!
//! Provides custom validation functions for the directories a backup job
//! reads from and writes to.

use validator::ValidationError;

use std::path::{Path, PathBuf};

pub fn validate_dir_exist<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        return Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("{:?} not found", dir).into()));
    }

    Ok(())
}

/// Rejects a destination that lies inside the source tree.
///
/// Paths are compared lexically after being made absolute, no symlink is resolved.
pub fn validate_destination_outside_source<P1: AsRef<Path>, P2: AsRef<Path>>(
    source: P1,
    destination: P2,
) -> Result<(), ValidationError> {
    let source = absolute_or_self(source.as_ref());
    let destination = absolute_or_self(destination.as_ref());
    if destination.starts_with(&source) {
        return Err(ValidationError::new("InvalidDestination").with_message(
            format!(
                "destination {:?} must not be inside source {:?}",
                destination, source
            )
            .into(),
        ));
    }

    Ok(())
}

fn absolute_or_self(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

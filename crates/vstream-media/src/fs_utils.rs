//! Filesystem utilities for intermediate artifacts.
//!
//! Removal is a single "remove if present" call, never an existence check
//! followed by a delete.

use std::io;
use std::path::Path;
use tokio::fs;

/// Remove a file, treating "already gone" as success.
///
/// Returns `true` if this call removed the file and `false` if it did not
/// exist.
pub async fn remove_if_present(path: impl AsRef<Path>) -> io::Result<bool> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Blocking variant of [`remove_if_present`] for use from `Drop`.
pub fn remove_if_present_blocking(path: impl AsRef<Path>) -> io::Result<bool> {
    match std::fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

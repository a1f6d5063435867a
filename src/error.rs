use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the current operation.
///
/// Per-file problems (an unreadable picture, a failed conversion) are not
/// represented here; they are logged and skipped, and the next full
/// reconciliation cycle picks the file up again.
#[derive(Debug, Error)]
pub enum Error {
    /// The scan target does not exist. Surfaced before any work is done.
    #[error("pictures folder not found: {0}")]
    FolderMissing(PathBuf),

    /// Catalog database failure. Fatal to the current operation, never
    /// retried.
    #[error("catalog database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Thumbnail cache module
///
/// This module owns the derived-artifact side of the album:
/// - Diffing a fresh scan against the catalog (reconcile.rs)
/// - Building thumbnails with a worker pool (builder.rs)
/// - Dropping orphaned records and artifacts (cleanup.rs)
/// - The orchestrator tying the stages together (pipeline.rs)

pub mod builder;
pub mod cleanup;
pub mod pipeline;
pub mod reconcile;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Get the thumbnail cache directory
/// Returns ~/.cache/photoshelf/thumbnails on Linux
pub fn cache_folder_path() -> PathBuf {
    let mut path = dirs_next::cache_dir()
        .or_else(dirs_next::home_dir)
        .expect("Could not determine cache directory");

    path.push("photoshelf");
    path.push("thumbnails");

    // Ensure the directory exists
    fs::create_dir_all(&path).expect("Failed to create thumbnail cache directory");

    path
}

/// Get the temp directory holding the stop marker
pub fn temp_folder_path() -> PathBuf {
    let mut path = dirs_next::cache_dir()
        .or_else(dirs_next::home_dir)
        .expect("Could not determine cache directory");

    path.push("photoshelf");
    path.push("temp");

    fs::create_dir_all(&path).expect("Failed to create temp directory");

    path
}

/// Where the cooperative stop marker lives for a given temp directory.
pub fn stop_signal_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join("stop_caching_signal")
}

/// Ask all running cache workers to stop after their current file.
pub fn request_stop(temp_dir: &Path) -> io::Result<()> {
    fs::write(stop_signal_path(temp_dir), b"")
}

/// Remove the stop marker; called at the start of every scan cycle.
pub fn clear_stop_signal(temp_dir: &Path) -> io::Result<()> {
    let marker = stop_signal_path(temp_dir);
    if marker.exists() {
        fs::remove_file(marker)?;
    }
    Ok(())
}

/// Polled by workers before starting each file's work.
pub fn stop_requested(temp_dir: &Path) -> bool {
    stop_signal_path(temp_dir).exists()
}

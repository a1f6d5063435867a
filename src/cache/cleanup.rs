use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::state::data::PicturesChanges;
use crate::state::library::Library;

/// Reconcile the catalog entries whose files the scan no longer found.
///
/// A missing path whose artifact is still referenced by another record
/// with a live file was merely moved: the artifact stays, only the stale
/// record is dropped. Anything else is gone for good: artifact file and
/// record are both deleted. `added` is derived presentation telemetry
/// (new-on-disk count minus moved count) and can go negative when a
/// cleanup-only cycle classifies moves.
pub fn clean_missing(
    non_existent: &[String],
    new_on_disk_count: usize,
    library: &Library,
    cache_dir: &Path,
) -> Result<PicturesChanges, Error> {
    // Artifact names still backed by a file on disk, re-read fresh so the
    // build stage's inserts are visible
    let reserved: HashSet<String> = library
        .read_all()?
        .into_iter()
        .filter(|record| !record.cached_name.is_empty() && Path::new(&record.path).exists())
        .map(|record| record.cached_name)
        .collect();

    let mut removed = 0usize;
    let mut moved = 0usize;

    for path in non_existent {
        match library.read_by_path(path)? {
            None => moved += 1,
            Some(record) => {
                if !record.cached_name.is_empty() && reserved.contains(&record.cached_name) {
                    moved += 1;
                } else {
                    if !record.cached_name.is_empty() {
                        let artifact = cache_dir.join(&record.cached_name);
                        if artifact.exists() {
                            fs::remove_file(artifact)?;
                        }
                    }
                    removed += 1;
                }
                library.delete_by_path(path)?;
            }
        }
    }

    Ok(PicturesChanges {
        removed,
        moved,
        added: new_on_disk_count as i64 - moved as i64,
    })
}

/// Summary of a maintenance pass over catalog and cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub removed_records: usize,
    pub removed_files: usize,
    pub remaining_records: usize,
    pub remaining_files: usize,
}

/// Full maintenance pass: drop duplicate records per path (keeping the
/// oldest), drop records outside the configured album root, delete cache
/// files no record references, then vacuum.
pub fn deep_clean(
    library: &Library,
    cache_dir: &Path,
    pictures_folder: &Path,
) -> Result<MaintenanceReport, Error> {
    let records = library.read_all()?;
    let mut removed_records = 0usize;

    let mut seen_paths = HashSet::new();
    for record in &records {
        if !seen_paths.insert(record.path.as_str()) {
            library.delete_by_id(record.id)?;
            removed_records += 1;
        }
    }

    for record in &records {
        if !Path::new(&record.path).starts_with(pictures_folder) {
            library.delete_by_path(&record.path)?;
            removed_records += 1;
        }
    }

    let referenced: HashSet<String> = library
        .read_all()?
        .into_iter()
        .filter(|record| !record.cached_name.is_empty())
        .map(|record| record.cached_name)
        .collect();

    let mut removed_files = 0usize;
    let mut remaining_files = 0usize;
    if let Ok(entries) = fs::read_dir(cache_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if referenced.contains(&name) {
                remaining_files += 1;
            } else {
                fs::remove_file(&path)?;
                removed_files += 1;
            }
        }
    }

    library.vacuum()?;
    let remaining_records = library.read_all()?.len();

    Ok(MaintenanceReport {
        removed_records,
        removed_files,
        remaining_records,
        remaining_files,
    })
}

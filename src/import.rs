//! Copy pictures from a foreign folder into the album, sorted into
//! capture-date subfolders. Byte-identical files already in place are
//! skipped; same-name files with different content get a numbered name.

use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::Converter;
use crate::error::Error;
use crate::scan::identity::read_fingerprint;
use crate::scan::scanner::scan_folder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Qualifying files found under the source folder
    pub scanned: usize,
    /// Files actually copied into the album
    pub imported: usize,
}

/// Import every supported picture under `source` into `pictures_folder`.
///
/// The target subfolder is the capture date ("2021-05-01"); pictures
/// without a readable capture time land in the album root. The next
/// reconciliation cycle indexes and caches whatever was copied.
pub fn import_folder(
    source: &Path,
    pictures_folder: &Path,
    converter: &Converter,
    workers: usize,
) -> Result<ImportOutcome, Error> {
    if !source.exists() {
        return Err(Error::FolderMissing(source.to_path_buf()));
    }

    let scan = scan_folder(source, converter.supported_types(), workers);
    let mut imported = 0usize;

    for file in &scan.files {
        let creation_time = converter.creation_time(file);
        let creation_date = creation_time.split(' ').next().unwrap_or("");

        let target_folder = if creation_date.is_empty() {
            pictures_folder.to_path_buf()
        } else {
            pictures_folder.join(creation_date)
        };
        if !target_folder.is_dir() {
            fs::create_dir_all(&target_folder)?;
        }

        let file_name = match file.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let target = target_folder.join(&file_name);

        if target.exists() {
            // Same bytes already imported under this name: skip it
            if read_fingerprint(file)? == read_fingerprint(&target)? {
                continue;
            }
            let renamed = duplicate_name(&file_name, &target_folder);
            fs::copy(file, target_folder.join(renamed))?;
        } else {
            fs::copy(file, &target)?;
        }

        imported += 1;
        if imported % 100 == 0 {
            println!("⏳ Imported {} files...", imported);
        }
    }

    Ok(ImportOutcome {
        scanned: scan.count(),
        imported,
    })
}

/// Grow " (1)" onto the file stem until the name is free in `folder`.
fn duplicate_name(file_name: &str, folder: &Path) -> String {
    let (mut stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) => (stem.to_string(), Some(extension.to_string())),
        None => (file_name.to_string(), None),
    };

    loop {
        stem.push_str(" (1)");
        let candidate = match &extension {
            Some(extension) => format!("{stem}.{extension}"),
            None => stem.clone(),
        };
        if !folder.join(&candidate).exists() {
            return candidate;
        }
    }
}

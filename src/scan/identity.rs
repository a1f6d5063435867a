use std::fs;
use std::io;
use std::path::Path;

/// Compute the content fingerprint of a file: the md5 hex digest of its
/// full byte content. Deterministic for unchanged content; the caller
/// decides what to do when the file cannot be read.
pub fn read_fingerprint(path: &Path) -> io::Result<String> {
    let content = fs::read(path)?;
    Ok(format!("{:x}", md5::compute(&content)))
}

/// Return the extension tag of a file, including the dot and preserving
/// case (".jpg", ".JPG"), or "unknown" when the file name has no dot.
pub fn file_type(path: &Path) -> String {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return String::from("unknown"),
    };

    match name.rsplit_once('.') {
        Some((_, extension)) => format!(".{extension}"),
        None => String::from("unknown"),
    }
}

/// A file qualifies when the allow-list is empty (match everything) or
/// contains its extension tag. Matching is case-sensitive; the allow-list
/// carries upper/lower duplicates on purpose.
pub fn matches_type(path: &Path, allowed_types: &[&str]) -> bool {
    allowed_types.is_empty() || allowed_types.contains(&file_type(path).as_str())
}

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::unbounded;
use walkdir::WalkDir;

use super::identity::matches_type;
use super::partition::partition;

/// Everything a single scan pass found beneath a root folder.
///
/// `picture_folders` is the subset of the root's immediate subdirectories
/// that transitively contain at least one qualifying file; the presentation
/// layer uses it for its jump-to-subfolder selector. Never persisted.
#[derive(Debug, Default, Clone)]
pub struct ScanOutcome {
    pub files: Vec<PathBuf>,
    pub picture_folders: Vec<PathBuf>,
}

impl ScanOutcome {
    pub fn count(&self) -> usize {
        self.files.len()
    }
}

/// Recursively scan `root` for files matching the allow-list.
///
/// The immediate children of `root` are split into files and
/// subdirectories. The subdirectories are partitioned into contiguous
/// chunks, one worker thread per chunk; each worker walks its assigned
/// subtrees depth-first and reports over a channel. Unreadable entries are
/// skipped, not fatal. Order across workers is not stable; completeness is
/// guaranteed for any worker count.
pub fn scan_folder(root: &Path, allowed_types: &[&str], workers: usize) -> ScanOutcome {
    let mut subdirectories = Vec::new();
    let mut top_level_files = Vec::new();

    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirectories.push(path);
            } else if path.is_file() {
                top_level_files.push(path);
            }
        }
    }

    let mut outcome = ScanOutcome::default();

    if !subdirectories.is_empty() {
        let chunks = partition(&subdirectories, workers);
        let (sender, receiver) = unbounded();

        thread::scope(|scope| {
            for chunk in chunks {
                let sender = sender.clone();
                scope.spawn(move || {
                    sender.send(scan_chunk(chunk, allowed_types)).ok();
                });
            }
            drop(sender);

            for (files, folders) in receiver {
                outcome.files.extend(files);
                outcome.picture_folders.extend(folders);
            }
        });
    }

    outcome.files.extend(
        top_level_files
            .into_iter()
            .filter(|path| matches_type(path, allowed_types)),
    );

    outcome
}

/// Walk one worker's assigned subdirectories. Returns the qualifying files
/// plus the assigned folders that turned out to contain at least one.
fn scan_chunk(folders: &[PathBuf], allowed_types: &[&str]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut picture_folders = Vec::new();

    for folder in folders {
        let found_before = files.len();

        // Unreadable subtrees produce Err entries; dropping them skips the
        // subtree and keeps walking siblings.
        for entry in WalkDir::new(folder)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && matches_type(entry.path(), allowed_types) {
                files.push(entry.into_path());
            }
        }

        if files.len() > found_before {
            picture_folders.push(folder.clone());
        }
    }

    (files, picture_folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const TYPES: &[&str] = &[".jpg", ".JPG", ".png", ".PNG"];

    fn build_tree(root: &Path) -> Vec<PathBuf> {
        let mut expected = Vec::new();
        let mut add = |relative: &str| {
            let path = root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, relative.as_bytes()).unwrap();
            expected.push(path);
        };

        add("top.jpg");
        add("a/one.jpg");
        add("a/deep/two.PNG");
        add("a/deep/deeper/three.jpg");
        add("b/four.png");
        add("c/empty_here/.keep.jpg");
        // Non-matching files must never show up
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::write(root.join("a/readme.md"), b"x").unwrap();
        expected
    }

    #[test]
    fn test_completeness_across_worker_counts() {
        let dir = tempfile::tempdir().unwrap();
        let expected: HashSet<PathBuf> = build_tree(dir.path()).into_iter().collect();

        for workers in [1, 2, 16] {
            let outcome = scan_folder(dir.path(), TYPES, workers);
            let found: HashSet<PathBuf> = outcome.files.iter().cloned().collect();
            assert_eq!(found, expected, "worker count {workers}");
            assert_eq!(outcome.count(), expected.len());
        }
    }

    #[test]
    fn test_picture_folders_lists_only_populated_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        build_tree(dir.path());
        fs::create_dir(dir.path().join("pictureless")).unwrap();

        let outcome = scan_folder(dir.path(), TYPES, 2);
        let folders: HashSet<PathBuf> = outcome.picture_folders.iter().cloned().collect();

        let expected: HashSet<PathBuf> = ["a", "b", "c"]
            .iter()
            .map(|name| dir.path().join(name))
            .collect();
        assert_eq!(folders, expected);
    }

    #[test]
    fn test_empty_root_scans_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = scan_folder(dir.path(), TYPES, 4);
        assert_eq!(outcome.count(), 0);
        assert!(outcome.picture_folders.is_empty());
    }

    #[test]
    fn test_empty_allow_list_matches_everything() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("anything.xyz"), b"x").unwrap();

        let outcome = scan_folder(dir.path(), &[], 1);
        assert_eq!(outcome.count(), 1);
    }
}

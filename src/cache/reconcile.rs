use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::scan::scanner::ScanOutcome;
use crate::state::data::PictureRecord;

/// The three disjoint change sets computed per cycle. Derived each run,
/// never persisted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconciliationOutcome {
    /// Indexed paths under the root that the scan no longer found;
    /// cleanup decides between "moved" and "removed"
    pub non_existent: Vec<String>,
    /// Scanned paths with no catalog entry, in scan order
    pub new_on_disk: Vec<String>,
    /// Indexed paths whose artifact is missing from the cache directory
    pub needs_rebuild: Vec<String>,
}

/// What the cycle has to do about the computed change sets.
#[derive(Debug, Clone, PartialEq)]
pub enum CachePlan {
    NoChange,
    /// Files disappeared but nothing needs converting
    CleanupOnly,
    /// Deduplicated worklist of paths needing a new or rebuilt artifact,
    /// first occurrence order preserved
    Build { worklist: Vec<String> },
}

/// Diff a fresh scan of `root` against the catalog snapshot and the cache
/// directory listing.
pub fn reconcile(
    root: &Path,
    records: &[PictureRecord],
    scan: &ScanOutcome,
    cache_dir: &Path,
) -> ReconciliationOutcome {
    let on_disk: Vec<String> = scan
        .files
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    let on_disk_set: HashSet<&str> = on_disk.iter().map(String::as_str).collect();

    let indexed: Vec<&PictureRecord> = records
        .iter()
        .filter(|record| Path::new(&record.path).starts_with(root))
        .collect();
    let indexed_set: HashSet<&str> = indexed.iter().map(|r| r.path.as_str()).collect();

    let cache_names = cache_directory_names(cache_dir);

    let non_existent = indexed
        .iter()
        .filter(|record| !on_disk_set.contains(record.path.as_str()))
        .map(|record| record.path.clone())
        .collect();

    let new_on_disk = on_disk
        .iter()
        .filter(|path| !indexed_set.contains(path.as_str()))
        .cloned()
        .collect();

    // An empty cached_name never appears in the listing, so records that
    // were never converted land here too.
    let needs_rebuild = indexed
        .iter()
        .filter(|record| !cache_names.contains(&record.cached_name))
        .map(|record| record.path.clone())
        .collect();

    ReconciliationOutcome {
        non_existent,
        new_on_disk,
        needs_rebuild,
    }
}

fn cache_directory_names(cache_dir: &Path) -> HashSet<String> {
    let mut names = HashSet::new();
    if let Ok(entries) = fs::read_dir(cache_dir) {
        for entry in entries.flatten() {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names
}

impl ReconciliationOutcome {
    pub fn plan(&self) -> CachePlan {
        if self.non_existent.is_empty()
            && self.new_on_disk.is_empty()
            && self.needs_rebuild.is_empty()
        {
            return CachePlan::NoChange;
        }

        if self.new_on_disk.is_empty() && self.needs_rebuild.is_empty() {
            return CachePlan::CleanupOnly;
        }

        let mut seen = HashSet::new();
        let worklist = self
            .new_on_disk
            .iter()
            .chain(self.needs_rebuild.iter())
            .filter(|path| seen.insert(path.as_str()))
            .cloned()
            .collect();

        CachePlan::Build { worklist }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(path: &str, fingerprint: &str, cached_name: &str) -> PictureRecord {
        PictureRecord {
            id: 0,
            path: path.to_string(),
            fingerprint: fingerprint.to_string(),
            creation_time: String::new(),
            cached_name: cached_name.to_string(),
        }
    }

    fn scan_of(paths: &[&str]) -> ScanOutcome {
        ScanOutcome {
            files: paths.iter().map(PathBuf::from).collect(),
            picture_folders: Vec::new(),
        }
    }

    #[test]
    fn test_unchanged_album_reports_no_change() {
        let cache = tempfile::tempdir().unwrap();
        fs::write(cache.path().join("aaaa.jpg"), b"").unwrap();

        let records = [record("/album/a.jpg", "aaaa", "aaaa.jpg")];
        let scan = scan_of(&["/album/a.jpg"]);

        let outcome = reconcile(Path::new("/album"), &records, &scan, cache.path());
        assert_eq!(outcome, ReconciliationOutcome::default());
        assert_eq!(outcome.plan(), CachePlan::NoChange);
    }

    #[test]
    fn test_new_files_and_missing_artifacts_build() {
        let cache = tempfile::tempdir().unwrap();
        fs::write(cache.path().join("aaaa.jpg"), b"").unwrap();

        let records = [
            record("/album/a.jpg", "aaaa", "aaaa.jpg"),
            // Artifact never built
            record("/album/b.jpg", "bbbb", ""),
            // Artifact file vanished from the cache directory
            record("/album/c.jpg", "cccc", "cccc.jpg"),
        ];
        let scan = scan_of(&["/album/a.jpg", "/album/b.jpg", "/album/c.jpg", "/album/d.jpg"]);

        let outcome = reconcile(Path::new("/album"), &records, &scan, cache.path());
        assert_eq!(outcome.non_existent, Vec::<String>::new());
        assert_eq!(outcome.new_on_disk, vec!["/album/d.jpg"]);
        assert_eq!(outcome.needs_rebuild, vec!["/album/b.jpg", "/album/c.jpg"]);

        match outcome.plan() {
            CachePlan::Build { worklist } => {
                assert_eq!(worklist, vec!["/album/d.jpg", "/album/b.jpg", "/album/c.jpg"]);
            }
            other => panic!("expected Build, got {other:?}"),
        }
    }

    #[test]
    fn test_worklist_deduplicates_keeping_first_occurrence() {
        let outcome = ReconciliationOutcome {
            non_existent: Vec::new(),
            new_on_disk: vec!["/album/x.jpg".into(), "/album/y.jpg".into()],
            needs_rebuild: vec!["/album/y.jpg".into(), "/album/z.jpg".into()],
        };

        match outcome.plan() {
            CachePlan::Build { worklist } => {
                assert_eq!(worklist, vec!["/album/x.jpg", "/album/y.jpg", "/album/z.jpg"]);
            }
            other => panic!("expected Build, got {other:?}"),
        }
    }

    #[test]
    fn test_vanished_files_alone_mean_cleanup_only() {
        let cache = tempfile::tempdir().unwrap();
        fs::write(cache.path().join("aaaa.jpg"), b"").unwrap();
        fs::write(cache.path().join("bbbb.jpg"), b"").unwrap();

        let records = [
            record("/album/a.jpg", "aaaa", "aaaa.jpg"),
            record("/album/b.jpg", "bbbb", "bbbb.jpg"),
        ];
        let scan = scan_of(&["/album/a.jpg"]);

        let outcome = reconcile(Path::new("/album"), &records, &scan, cache.path());
        assert_eq!(outcome.non_existent, vec!["/album/b.jpg"]);
        assert_eq!(outcome.plan(), CachePlan::CleanupOnly);
    }

    #[test]
    fn test_records_outside_root_are_ignored() {
        let cache = tempfile::tempdir().unwrap();

        let records = [record("/elsewhere/old.jpg", "dddd", "dddd.jpg")];
        let scan = scan_of(&[]);

        let outcome = reconcile(Path::new("/album"), &records, &scan, cache.path());
        assert_eq!(outcome, ReconciliationOutcome::default());
    }
}

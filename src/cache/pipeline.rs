use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;

use crate::convert::Converter;
use crate::error::Error;
use crate::scan::scanner::{scan_folder, ScanOutcome};
use crate::state::data::Notification;
use crate::state::library::Library;

use super::builder::build_cache;
use super::cleanup::clean_missing;
use super::reconcile::{reconcile, CachePlan};
use super::clear_stop_signal;

/// Sequences one album cycle: scan -> reconcile -> build -> clean, fanning
/// progress out to the presentation layer as each stage completes.
pub struct CachePipeline {
    pub library: Library,
    pub converter: Converter,
    pub cache_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub threads: usize,
}

impl CachePipeline {
    pub fn new(
        library: Library,
        converter: Converter,
        cache_dir: PathBuf,
        temp_dir: PathBuf,
        threads: usize,
    ) -> Self {
        CachePipeline {
            library,
            converter,
            cache_dir,
            temp_dir,
            threads: threads.max(1),
        }
    }

    /// Count-only mode, used by simple folder-open and by import: scan the
    /// folder and report what is there without touching catalog or cache.
    pub fn count_pictures(&self, root: &Path) -> Result<ScanOutcome, Error> {
        if !root.exists() {
            return Err(Error::FolderMissing(root.to_path_buf()));
        }
        Ok(scan_folder(root, self.converter.supported_types(), self.threads))
    }

    /// Run a full reconciliation cycle over `root`.
    ///
    /// Clears any leftover stop marker first; a stop requested during the
    /// build stage only discards the not-yet-started work, which the next
    /// cycle picks up again. Store errors abort the cycle.
    pub fn refresh(&self, root: &Path, notify: &Sender<Notification>) -> Result<(), Error> {
        clear_stop_signal(&self.temp_dir)?;

        if !root.exists() {
            return Err(Error::FolderMissing(root.to_path_buf()));
        }

        let scan = scan_folder(root, self.converter.supported_types(), self.threads);
        notify.send(Notification::ScannedCount(scan.count())).ok();

        let records = self.library.read_all()?;
        let outcome = reconcile(root, &records, &scan, &self.cache_dir);

        match outcome.plan() {
            CachePlan::NoChange => {
                notify.send(Notification::CacheNeeded(false)).ok();
                notify.send(Notification::NoChange).ok();
            }
            CachePlan::CleanupOnly => {
                notify.send(Notification::CacheNeeded(false)).ok();
                let changes =
                    clean_missing(&outcome.non_existent, 0, &self.library, &self.cache_dir)?;
                notify.send(Notification::Changes(changes)).ok();
            }
            CachePlan::Build { worklist } => {
                notify.send(Notification::CacheNeeded(true)).ok();

                let rebuild_set: HashSet<String> =
                    outcome.needs_rebuild.iter().cloned().collect();
                let converted = build_cache(
                    &worklist,
                    &rebuild_set,
                    self.threads,
                    &self.library,
                    &self.converter,
                    &self.cache_dir,
                    &self.temp_dir,
                    notify,
                )?;
                notify.send(Notification::BuildDone(converted)).ok();

                let changes = clean_missing(
                    &outcome.non_existent,
                    outcome.new_on_disk.len(),
                    &self.library,
                    &self.cache_dir,
                )?;
                notify.send(Notification::Changes(changes)).ok();
            }
        }

        Ok(())
    }
}

use std::collections::HashSet;
use std::path::Path;
use std::thread;

use crossbeam_channel::{unbounded, Sender};

use crate::convert::{Converter, THUMBNAIL_RESIZE};
use crate::error::Error;
use crate::scan::identity::read_fingerprint;
use crate::scan::partition::partition;
use crate::state::data::Notification;
use crate::state::library::Library;

use super::stop_requested;

/// Messages a build worker sends its coordinator. The coordinator owns all
/// aggregation state; workers share nothing writable.
enum BuildMessage {
    /// One file handled (converted or not)
    Progress(String),
    /// Worker finished its chunk: the files it newly converted, or the
    /// store error that stopped it
    Done(Result<Vec<String>, Error>),
}

/// Build thumbnails for every path in the worklist.
///
/// The worklist is split into contiguous chunks, one worker thread per
/// chunk. Workers classify each file against the catalog, convert where an
/// artifact is missing, and report per-file progress; the coordinator
/// emits [`Notification::BuildProgress`] with the percentage of the whole
/// worklist handled so far and returns the total number of files converted
/// this run once every worker has reported.
///
/// A present stop marker makes each worker drop the rest of its chunk;
/// skipped files are picked up again by the next scan cycle. Store errors
/// fail the whole build (after all workers have wound down); conversion
/// failures only exclude the file from this run's count.
pub fn build_cache(
    worklist: &[String],
    rebuild_set: &HashSet<String>,
    workers: usize,
    library: &Library,
    converter: &Converter,
    cache_dir: &Path,
    temp_dir: &Path,
    notify: &Sender<Notification>,
) -> Result<usize, Error> {
    if worklist.is_empty() {
        return Ok(0);
    }

    let chunks = partition(worklist, workers);
    let (sender, receiver) = unbounded();

    let mut converted_total = 0;
    let mut first_error = None;

    thread::scope(|scope| {
        for chunk in chunks {
            let sender = sender.clone();
            scope.spawn(move || {
                let outcome = cache_worker(chunk, rebuild_set, library, converter, cache_dir, temp_dir, &sender);
                sender.send(BuildMessage::Done(outcome)).ok();
            });
        }
        drop(sender);

        let mut processed = 0usize;
        for message in receiver {
            match message {
                BuildMessage::Progress(path) => {
                    processed += 1;
                    let percent = (processed * 100 / worklist.len()) as u8;
                    notify
                        .send(Notification::BuildProgress { path, percent })
                        .ok();
                }
                BuildMessage::Done(Ok(converted)) => converted_total += converted.len(),
                BuildMessage::Done(Err(error)) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }
    });

    match first_error {
        Some(error) => Err(error),
        None => Ok(converted_total),
    }
}

/// Handle one worker's chunk. Returns the paths it newly converted.
fn cache_worker(
    chunk: &[String],
    rebuild_set: &HashSet<String>,
    library: &Library,
    converter: &Converter,
    cache_dir: &Path,
    temp_dir: &Path,
    sender: &Sender<BuildMessage>,
) -> Result<Vec<String>, Error> {
    // Snapshot of the catalog at worker start; each path belongs to
    // exactly one worker's chunk, so stale entries for other chunks only
    // cost a redundant exists() check, never a conflicting write.
    let records = library.read_all()?;
    let known_paths: HashSet<&str> = records.iter().map(|r| r.path.as_str()).collect();
    let known_fingerprints: HashSet<&str> =
        records.iter().map(|r| r.fingerprint.as_str()).collect();

    let mut converted = Vec::new();

    for path in chunk {
        if stop_requested(temp_dir) {
            break;
        }

        let source = Path::new(path);
        let fingerprint = match read_fingerprint(source) {
            Ok(fingerprint) => fingerprint,
            Err(error) => {
                eprintln!("⚠️  Cannot fingerprint {path}: {error}");
                sender.send(BuildMessage::Progress(path.clone())).ok();
                continue;
            }
        };

        let path_known = known_paths.contains(path.as_str());
        let fingerprint_known = known_fingerprints.contains(fingerprint.as_str());
        let mut needs_artifact = rebuild_set.contains(path);

        if path_known && !fingerprint_known {
            // Content changed under a known path
            library.update_fingerprint(path, &fingerprint)?;
            needs_artifact = true;
        } else if !path_known && fingerprint_known {
            // Moved or renamed file: carry the capture time over and keep
            // sharing the artifact
            let creation_time = library
                .read_by_fingerprint(&fingerprint)?
                .map(|record| record.creation_time)
                .unwrap_or_default();
            library.insert(path, &fingerprint, &creation_time)?;
            needs_artifact = true;
        } else if !path_known && !fingerprint_known {
            // Brand new picture
            let creation_time = converter.creation_time(source);
            library.insert(path, &fingerprint, &creation_time)?;
            needs_artifact = true;
        }

        if needs_artifact {
            let cached_name = format!("{fingerprint}.jpg");
            let artifact = cache_dir.join(&cached_name);

            if !artifact.exists() {
                if converter.convert(source, &artifact, THUMBNAIL_RESIZE) {
                    converted.push(path.clone());
                } else {
                    eprintln!("⚠️  Failed to convert {path}");
                }
            }

            // Idempotent re-pointing, whether or not conversion ran
            library.update_cached_name(path, &cached_name)?;
        }

        sender.send(BuildMessage::Progress(path.clone())).ok();
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::request_stop;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::path::PathBuf;

    struct Fixture {
        _root: tempfile::TempDir,
        album: PathBuf,
        cache: PathBuf,
        temp: PathBuf,
        library: Library,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let album = root.path().join("album");
        let cache = root.path().join("cache");
        let temp = root.path().join("temp");
        fs::create_dir_all(&album).unwrap();
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(&temp).unwrap();
        let library = Library::open(&root.path().join("catalog.db")).unwrap();
        Fixture { _root: root, album, cache, temp, library }
    }

    fn write_picture(path: &Path, shade: u8) {
        RgbImage::from_pixel(60, 60, Rgb([shade, shade, 0]))
            .save(path)
            .unwrap();
    }

    fn run_build(fx: &Fixture, worklist: &[String], rebuild: &HashSet<String>) -> (usize, Vec<Notification>) {
        let (notify, events) = unbounded();
        let converted = build_cache(
            worklist,
            rebuild,
            2,
            &fx.library,
            &Converter::Builtin,
            &fx.cache,
            &fx.temp,
            &notify,
        )
        .unwrap();
        drop(notify);
        (converted, events.iter().collect())
    }

    #[test]
    fn test_fresh_pictures_get_records_and_artifacts() {
        let fx = fixture();
        let mut worklist = Vec::new();
        for (n, shade) in [(1u8, 10u8), (2, 120), (3, 240)] {
            let path = fx.album.join(format!("pic{n}.png"));
            write_picture(&path, shade);
            worklist.push(path.to_string_lossy().into_owned());
        }

        let (converted, events) = run_build(&fx, &worklist, &HashSet::new());
        assert_eq!(converted, 3);

        let records = fx.library.read_all().unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.fingerprint.len(), 32);
            assert_eq!(record.cached_name, format!("{}.jpg", record.fingerprint));
            assert!(fx.cache.join(&record.cached_name).exists());
            assert!(!record.creation_time.is_empty());
        }

        let percents: Vec<u8> = events
            .iter()
            .filter_map(|event| match event {
                Notification::BuildProgress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.len(), 3);
        assert_eq!(*percents.last().unwrap(), 100);
    }

    #[test]
    fn test_moved_picture_reuses_artifact_and_capture_time() {
        let fx = fixture();
        let old_path = fx.album.join("old.png");
        write_picture(&old_path, 77);
        let fingerprint = read_fingerprint(&old_path).unwrap();

        fx.library
            .insert(&old_path.to_string_lossy(), &fingerprint, "2020-01-01 00:00:00")
            .unwrap();
        let cached_name = format!("{fingerprint}.jpg");
        fx.library
            .update_cached_name(&old_path.to_string_lossy(), &cached_name)
            .unwrap();
        fs::write(fx.cache.join(&cached_name), b"existing artifact").unwrap();

        let new_path = fx.album.join("new.png");
        fs::rename(&old_path, &new_path).unwrap();

        let worklist = vec![new_path.to_string_lossy().into_owned()];
        let (converted, _) = run_build(&fx, &worklist, &HashSet::new());

        // Artifact already existed, so nothing was converted this run
        assert_eq!(converted, 0);

        let record = fx
            .library
            .read_by_path(&new_path.to_string_lossy())
            .unwrap()
            .unwrap();
        assert_eq!(record.fingerprint, fingerprint);
        assert_eq!(record.creation_time, "2020-01-01 00:00:00");
        assert_eq!(record.cached_name, cached_name);

        // The artifact was reused, not rewritten
        assert_eq!(fs::read(fx.cache.join(&cached_name)).unwrap(), b"existing artifact");
    }

    #[test]
    fn test_changed_content_updates_fingerprint_and_rebuilds() {
        let fx = fixture();
        let path = fx.album.join("edited.png");
        write_picture(&path, 10);
        let path_string = path.to_string_lossy().into_owned();

        fx.library.insert(&path_string, "feedfacefeedfacefeedfacefeedface", "").unwrap();

        let (converted, _) = run_build(&fx, &[path_string.clone()], &HashSet::new());
        assert_eq!(converted, 1);

        let record = fx.library.read_by_path(&path_string).unwrap().unwrap();
        assert_eq!(record.fingerprint, read_fingerprint(&path).unwrap());
        assert!(fx.cache.join(&record.cached_name).exists());
    }

    #[test]
    fn test_rebuild_set_forces_conversion_without_record_changes() {
        let fx = fixture();
        let path = fx.album.join("stable.png");
        write_picture(&path, 55);
        let path_string = path.to_string_lossy().into_owned();
        let fingerprint = read_fingerprint(&path).unwrap();

        fx.library.insert(&path_string, &fingerprint, "2021-01-01 00:00:00").unwrap();

        let rebuild: HashSet<String> = [path_string.clone()].into_iter().collect();
        let (converted, _) = run_build(&fx, &[path_string.clone()], &rebuild);

        assert_eq!(converted, 1);
        assert!(fx.cache.join(format!("{fingerprint}.jpg")).exists());

        let record = fx.library.read_by_path(&path_string).unwrap().unwrap();
        assert_eq!(record.creation_time, "2021-01-01 00:00:00");
    }

    #[test]
    fn test_stop_signal_discards_remaining_work() {
        let fx = fixture();
        let mut worklist = Vec::new();
        for n in 0u8..4 {
            let path = fx.album.join(format!("pic{n}.png"));
            write_picture(&path, n * 40);
            worklist.push(path.to_string_lossy().into_owned());
        }

        request_stop(&fx.temp).unwrap();
        let (converted, events) = run_build(&fx, &worklist, &HashSet::new());

        assert_eq!(converted, 0);
        assert!(events.is_empty());
        assert!(fx.library.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_file_is_skipped_not_fatal() {
        let fx = fixture();
        let good = fx.album.join("good.png");
        write_picture(&good, 200);

        let worklist = vec![
            fx.album.join("vanished.png").to_string_lossy().into_owned(),
            good.to_string_lossy().into_owned(),
        ];

        let (converted, events) = run_build(&fx, &worklist, &HashSet::new());
        assert_eq!(converted, 1);
        assert_eq!(events.len(), 2);
        assert_eq!(fx.library.read_all().unwrap().len(), 1);
    }
}

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use crossbeam_channel::unbounded;

use photoshelf::cache;
use photoshelf::cache::cleanup::deep_clean;
use photoshelf::cache::pipeline::CachePipeline;
use photoshelf::convert::Converter;
use photoshelf::import::import_folder;
use photoshelf::state::data::Notification;
use photoshelf::state::library::Library;
use photoshelf::Error;

/// What the command line asked for
enum Action {
    /// Full reconciliation cycle over the album (the default)
    Refresh(Option<PathBuf>),
    /// Count-only scan, no catalog or cache work
    Count(Option<PathBuf>),
    /// Copy pictures from a foreign folder into the album
    Import(PathBuf),
    /// Catalog and cache maintenance pass
    DeepClean,
    /// Ask a running cache build to stop
    Stop,
}

fn main() -> ExitCode {
    let action = match parse_action() {
        Some(action) => action,
        None => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(action) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("❌ {error}");
            ExitCode::FAILURE
        }
    }
}

fn parse_action() -> Option<Action> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None => Some(Action::Refresh(None)),
        Some("--count") => Some(Action::Count(args.get(1).map(PathBuf::from))),
        Some("--import") => args.get(1).map(|source| Action::Import(PathBuf::from(source))),
        Some("--deep-clean") => Some(Action::DeepClean),
        Some("--stop") => Some(Action::Stop),
        Some(flag) if flag.starts_with('-') => None,
        Some(folder) => Some(Action::Refresh(Some(PathBuf::from(folder)))),
    }
}

fn print_usage() {
    eprintln!("Usage: photoshelf [FOLDER]            refresh the album catalog and thumbnail cache");
    eprintln!("       photoshelf --count [FOLDER]    scan and report the picture count only");
    eprintln!("       photoshelf --import FOLDER     copy pictures into the album by capture date");
    eprintln!("       photoshelf --deep-clean        drop stale records and orphaned thumbnails");
    eprintln!("       photoshelf --stop              stop a running cache build");
}

fn run(action: Action) -> Result<(), Error> {
    let library = Library::open(&Library::default_path())?;
    let converter = Converter::detect();
    let threads = library.cache_threads()?;

    let pipeline = CachePipeline::new(
        library,
        converter,
        cache::cache_folder_path(),
        cache::temp_folder_path(),
        threads,
    );

    match action {
        Action::Stop => {
            cache::request_stop(&pipeline.temp_dir)?;
            println!("🛑 Stop requested; workers finish their current file and wind down.");
        }

        Action::Count(folder) => {
            let root = resolve_folder(&pipeline.library, folder)?;
            let outcome = pipeline.count_pictures(&root)?;
            println!("🔍 Found {} images under {}.", outcome.count(), root.display());

            let mut names: Vec<String> = outcome
                .picture_folders
                .iter()
                .filter_map(|folder| folder.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            names.sort();
            for name in names {
                println!("   📂 {name}");
            }
        }

        Action::Import(source) => {
            let album = pipeline.library.pictures_folder()?;
            println!("🔍 Scanning folder: {}", source.display());
            let outcome = import_folder(&source, &album, &pipeline.converter, pipeline.threads)?;
            println!(
                "✅ Import complete: {} of {} scanned pictures copied into {}.",
                outcome.imported,
                outcome.scanned,
                album.display()
            );
        }

        Action::DeepClean => {
            let album = pipeline.library.pictures_folder()?;
            let report = deep_clean(&pipeline.library, &pipeline.cache_dir, &album)?;
            println!(
                "✅ Maintenance done: dropped {} records and {} cache files.",
                report.removed_records, report.removed_files
            );
            println!(
                "📊 {} records and {} cache files remain.",
                report.remaining_records, report.remaining_files
            );
        }

        Action::Refresh(folder) => {
            let root = resolve_folder(&pipeline.library, folder)?;
            println!("🔍 Scanning folder: {}", root.display());

            let (notify, events) = unbounded();
            thread::scope(|scope| {
                let sender = notify.clone();
                let worker = scope.spawn(move || pipeline.refresh(&root, &sender));

                // The sender lives only in the pipeline thread now, so the
                // print loop ends when the cycle does
                drop(notify);
                for event in events.iter() {
                    print_notification(&event);
                }

                worker.join().expect("pipeline thread panicked")
            })?;
        }
    }

    Ok(())
}

/// An explicitly named folder becomes the configured album root; without
/// one, the stored setting (or the system Pictures folder) is used.
fn resolve_folder(library: &Library, folder: Option<PathBuf>) -> Result<PathBuf, Error> {
    match folder {
        Some(folder) => {
            if library.pictures_folder()? != folder {
                library.save_pictures_folder(&folder)?;
            }
            Ok(folder)
        }
        None => Ok(library.pictures_folder()?),
    }
}

fn print_notification(event: &Notification) {
    match event {
        Notification::ScannedCount(count) => println!("🔍 Found {count} images."),
        Notification::CacheNeeded(true) => {
            println!("🗃️  Pictures are being indexed and cached; this may take a while.");
        }
        Notification::CacheNeeded(false) => {}
        Notification::NoChange => println!("There is no change."),
        Notification::BuildProgress { path, percent } => {
            println!("⏳ [{percent:>3}%] {path}");
        }
        Notification::BuildDone(0) => println!("No image is cached this time."),
        Notification::BuildDone(1) => println!("An image is cached this time."),
        Notification::BuildDone(count) => println!("{count} images are cached this time."),
        Notification::Changes(changes) => {
            if changes.added != 0 {
                println!("📥 {} newly added images.", changes.added);
            }
            if changes.moved != 0 {
                println!("📦 Positional changes of {} images found.", changes.moved);
            }
            if changes.removed != 0 {
                println!("🗑️  {} images removed from the folder.", changes.removed);
            }
            if changes.removed == 0 && changes.moved == 0 && changes.added == 0 {
                println!("✅ Catalog is up to date.");
            }
        }
    }
}

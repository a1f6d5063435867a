use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};
use image::imageops::FilterType;

/// Thumbnail geometry: height-bounded to 250px, aspect ratio preserved
/// (ImageMagick "x250" syntax).
pub const THUMBNAIL_RESIZE: &str = "x250";

/// The image-conversion and metadata-extraction tool.
///
/// When an ImageMagick installation is found it is invoked as an external
/// command, which also unlocks the extended format list. Without it, a
/// built-in converter based on the `image` crate covers the base formats.
#[derive(Debug, Clone)]
pub enum Converter {
    ImageMagick { convert: PathBuf, identify: PathBuf },
    Builtin,
}

impl Converter {
    /// Probe the platform's ImageMagick install location.
    pub fn detect() -> Self {
        let (convert, identify) = external_programs();
        if convert.exists() {
            Converter::ImageMagick { convert, identify }
        } else {
            Converter::Builtin
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Converter::ImageMagick { .. })
    }

    /// The supported picture extensions, with upper/lower duplicates
    /// because matching is case-sensitive. ImageMagick extends the list.
    pub fn supported_types(&self) -> &'static [&'static str] {
        match self {
            Converter::ImageMagick { .. } => &[
                ".bmp", ".BMP", ".gif", ".GIF", ".jpeg", ".JPEG", ".jpg", ".JPG", ".png", ".PNG",
                ".heic", ".HEIC", ".webp", ".WEBP", ".tiff", ".TIFF", ".tif", ".TIF", ".dds",
                ".DDS", ".dcm", ".DCM", ".xcf", ".XCF",
            ],
            Converter::Builtin => &[
                ".bmp", ".BMP", ".gif", ".GIF", ".jpeg", ".JPEG", ".jpg", ".JPG", ".png", ".PNG",
            ],
        }
    }

    /// Produce a resized derivative of `source` at `target`.
    ///
    /// Returns false when conversion fails; the caller treats that as a
    /// per-file failure, never as a batch failure. A hung external
    /// converter blocks its worker: there is no timeout.
    pub fn convert(&self, source: &Path, target: &Path, resize: &str) -> bool {
        match self {
            Converter::ImageMagick { convert, .. } => Command::new(convert)
                .arg(source)
                .arg("-auto-orient")
                .arg("-resize")
                .arg(resize)
                .arg(target)
                .status()
                .map(|status| status.success())
                .unwrap_or(false),
            Converter::Builtin => builtin_convert(source, target, resize).is_some(),
        }
    }

    /// Read the capture timestamp of a picture as "YYYY-MM-DD HH:MM:SS".
    ///
    /// Prefers the embedded EXIF original date; falls back to the time the
    /// tool (or the filesystem) reports the file was created. May be empty.
    pub fn creation_time(&self, source: &Path) -> String {
        match self {
            Converter::ImageMagick { identify, .. } => {
                let mut command = Command::new(identify);
                if cfg!(windows) {
                    // Windows ships a single magick.exe front
                    command.arg("identify");
                }
                let output = command
                    .arg("-format")
                    .arg("%[date:*]%[exif:*]")
                    .arg(source)
                    .output();

                match output {
                    Ok(output) => parse_identify_times(&String::from_utf8_lossy(&output.stdout)),
                    Err(_) => String::new(),
                }
            }
            Converter::Builtin => filesystem_creation_time(source),
        }
    }
}

/// Platform install locations probed for ImageMagick.
fn external_programs() -> (PathBuf, PathBuf) {
    if cfg!(windows) {
        let folder = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_default()
            .join("ImageMagick");
        (folder.join("magick.exe"), folder.join("magick.exe"))
    } else if cfg!(target_os = "macos") {
        (
            PathBuf::from("/opt/local/bin/convert"),
            PathBuf::from("/opt/local/bin/identify"),
        )
    } else {
        (
            PathBuf::from("/usr/bin/convert"),
            PathBuf::from("/usr/bin/identify"),
        )
    }
}

/// Pick the capture time out of `identify -format "%[date:*]%[exif:*]"`
/// output. "exif:DateTimeOriginal=2021:05:01 09:30:00" wins over
/// "date:create=2021-05-02T10:00:00+00:00".
fn parse_identify_times(output: &str) -> String {
    let mut creation_time = String::new();

    for line in output.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("exif:DateTimeOriginal=") {
            if let Some((date, time)) = value.trim().split_once(' ') {
                creation_time = format!("{} {}", date.replace(':', "-"), time);
            }
        } else if creation_time.is_empty() {
            if let Some(value) = line.strip_prefix("date:create=") {
                let mut value = value.trim();
                // Drop any timezone suffix from the ISO form
                if value.len() > 19 {
                    value = &value[..19];
                }
                creation_time = value.replacen('T', " ", 1);
            }
        }
    }

    creation_time
}

/// Built-in conversion path: decode, scale to the bounded height, flatten
/// any alpha channel and save as JPEG.
fn builtin_convert(source: &Path, target: &Path, resize: &str) -> Option<()> {
    let picture = image::open(source).ok()?;

    let resized = match parse_height_bound(resize) {
        Some(height) if picture.height() > 0 => {
            let width = (u64::from(picture.width()) * u64::from(height)
                / u64::from(picture.height()))
            .max(1) as u32;
            picture.resize_exact(width, height, FilterType::Lanczos3)
        }
        _ => picture,
    };

    // JPEG output cannot carry alpha
    image::DynamicImage::ImageRgb8(resized.to_rgb8())
        .save(target)
        .ok()
}

/// "x250" -> 250. Anything else means no resizing.
fn parse_height_bound(resize: &str) -> Option<u32> {
    resize.strip_prefix('x')?.parse().ok()
}

/// Filesystem fallback for the capture timestamp: creation time where the
/// platform reports one, else the modification time.
fn filesystem_creation_time(source: &Path) -> String {
    let metadata = match std::fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(_) => return String::new(),
    };

    let time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .ok();

    match time {
        Some(time) => {
            let time: DateTime<Local> = time.into();
            time.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        None => String::new(),
    }
}

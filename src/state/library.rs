use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::{Path, PathBuf};

use super::data::PictureRecord;
use super::settings::{self, WindowGeometry};

/// The Library manages the SQLite catalog database.
///
/// It stores one record per picture path plus the application settings.
/// Only the database path is held here: every operation opens its own
/// connection, mutates and commits, so cache workers on separate threads
/// never share a handle and each logical operation is its own transaction.
#[derive(Debug, Clone)]
pub struct Library {
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the catalog at `db_path` and initialize its schema.
    pub fn open(db_path: &Path) -> SqlResult<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .expect("Failed to create application data directory");
        }

        let library = Library {
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// The default catalog location in the user's data directory:
    /// - Linux: ~/.local/share/photoshelf/photoshelf.db
    /// - macOS: ~/Library/Application Support/photoshelf/photoshelf.db
    /// - Windows: %APPDATA%\photoshelf\photoshelf.db
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .expect("Could not determine user data directory");

        path.push("photoshelf");
        path.push("photoshelf.db");
        path
    }

    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    fn connect(&self) -> SqlResult<Connection> {
        Connection::open(&self.db_path)
    }

    /// Create tables and seed the default settings if they don't exist.
    fn init_schema(&self) -> SqlResult<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pictures (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                picture_path    TEXT NOT NULL UNIQUE,
                picture_md5     TEXT,
                creation_time   TEXT,
                cached_name     TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                item            TEXT NOT NULL UNIQUE,
                value           TEXT
            )",
            [],
        )?;

        let default_folder = settings::default_pictures_folder();
        self.seed_setting(&conn, "pictures_folder_path", &default_folder.to_string_lossy())?;
        self.seed_setting(&conn, "latest_geometry", "")?;
        self.seed_setting(&conn, "zoomed_size", "")?;
        self.seed_setting(&conn, "cache_threads_number", "")?;

        Ok(())
    }

    fn seed_setting(&self, conn: &Connection, item: &str, value: &str) -> SqlResult<()> {
        conn.execute(
            "INSERT OR IGNORE INTO settings (item, value) VALUES (?1, ?2)",
            params![item, value],
        )?;
        Ok(())
    }

    // ---- pictures ----

    /// Get every picture record in the catalog, in insertion order.
    pub fn read_all(&self) -> SqlResult<Vec<PictureRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, picture_path, COALESCE(picture_md5, ''),
                    COALESCE(creation_time, ''), COALESCE(cached_name, '')
             FROM pictures ORDER BY id",
        )?;

        let record_iter = stmt.query_map([], |row| {
            Ok(PictureRecord {
                id: row.get(0)?,
                path: row.get(1)?,
                fingerprint: row.get(2)?,
                creation_time: row.get(3)?,
                cached_name: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }

        Ok(records)
    }

    pub fn read_by_path(&self, path: &str) -> SqlResult<Option<PictureRecord>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, picture_path, COALESCE(picture_md5, ''),
                    COALESCE(creation_time, ''), COALESCE(cached_name, '')
             FROM pictures WHERE picture_path = ?1",
            params![path],
            |row| {
                Ok(PictureRecord {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    fingerprint: row.get(2)?,
                    creation_time: row.get(3)?,
                    cached_name: row.get(4)?,
                })
            },
        )
        .optional()
    }

    /// First record carrying the given content fingerprint, if any.
    pub fn read_by_fingerprint(&self, fingerprint: &str) -> SqlResult<Option<PictureRecord>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, picture_path, COALESCE(picture_md5, ''),
                    COALESCE(creation_time, ''), COALESCE(cached_name, '')
             FROM pictures WHERE picture_md5 = ?1 ORDER BY id LIMIT 1",
            params![fingerprint],
            |row| {
                Ok(PictureRecord {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    fingerprint: row.get(2)?,
                    creation_time: row.get(3)?,
                    cached_name: row.get(4)?,
                })
            },
        )
        .optional()
    }

    /// Insert a record for a newly observed picture. Replaces any stale
    /// record at the same path, which also clears its cached name.
    pub fn insert(&self, path: &str, fingerprint: &str, creation_time: &str) -> SqlResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO pictures (picture_path, picture_md5, creation_time)
             VALUES (?1, ?2, ?3)",
            params![path, fingerprint, creation_time],
        )?;
        Ok(())
    }

    pub fn update_fingerprint(&self, path: &str, fingerprint: &str) -> SqlResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE pictures SET picture_md5 = ?1 WHERE picture_path = ?2",
            params![fingerprint, path],
        )?;
        Ok(())
    }

    pub fn update_cached_name(&self, path: &str, cached_name: &str) -> SqlResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE pictures SET cached_name = ?1 WHERE picture_path = ?2",
            params![cached_name, path],
        )?;
        Ok(())
    }

    pub fn delete_by_path(&self, path: &str) -> SqlResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM pictures WHERE picture_path = ?1", params![path])?;
        Ok(())
    }

    pub fn delete_by_id(&self, id: i64) -> SqlResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM pictures WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Reclaim space after record deletions.
    pub fn vacuum(&self) -> SqlResult<()> {
        let conn = self.connect()?;
        conn.execute_batch("VACUUM")?;
        Ok(())
    }

    // ---- settings ----

    pub fn read_setting(&self, item: &str) -> SqlResult<Option<String>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT value FROM settings WHERE item = ?1",
            params![item],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn save_setting(&self, item: &str, value: &str) -> SqlResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO settings (item, value) VALUES (?1, ?2)
             ON CONFLICT(item) DO UPDATE SET value = excluded.value",
            params![item, value],
        )?;
        Ok(())
    }

    /// The configured album root, falling back to the system Pictures
    /// folder when the setting is empty.
    pub fn pictures_folder(&self) -> SqlResult<PathBuf> {
        let stored = self.read_setting("pictures_folder_path")?.unwrap_or_default();
        if stored.is_empty() {
            Ok(settings::default_pictures_folder())
        } else {
            Ok(PathBuf::from(stored))
        }
    }

    pub fn save_pictures_folder(&self, folder: &Path) -> SqlResult<()> {
        self.save_setting("pictures_folder_path", &folder.to_string_lossy())
    }

    /// The configured worker count, defaulting to half the logical CPUs.
    pub fn cache_threads(&self) -> SqlResult<usize> {
        let stored = self.read_setting("cache_threads_number")?.unwrap_or_default();
        match stored.parse::<usize>() {
            Ok(threads) if threads > 0 => Ok(threads),
            _ => Ok(settings::default_thread_count()),
        }
    }

    pub fn save_cache_threads(&self, threads: usize) -> SqlResult<()> {
        self.save_setting("cache_threads_number", &threads.to_string())
    }

    pub fn latest_geometry(&self) -> SqlResult<Option<WindowGeometry>> {
        let stored = self.read_setting("latest_geometry")?.unwrap_or_default();
        Ok(WindowGeometry::from_json(&stored).ok())
    }

    pub fn save_latest_geometry(&self, geometry: &WindowGeometry) -> SqlResult<()> {
        self.save_setting("latest_geometry", &geometry.to_json().unwrap_or_default())
    }

    pub fn zoomed_size(&self) -> SqlResult<Option<WindowGeometry>> {
        let stored = self.read_setting("zoomed_size")?.unwrap_or_default();
        Ok(WindowGeometry::from_json(&stored).ok())
    }

    pub fn save_zoomed_size(&self, geometry: &WindowGeometry) -> SqlResult<()> {
        self.save_setting("zoomed_size", &geometry.to_json().unwrap_or_default())
    }
}

/// Shared data structures for the pipeline
///
/// These structs represent the data model that flows between the catalog
/// layer, the cache pipeline and the presentation layer.

/// One catalog entry per unique picture path.
#[derive(Debug, Clone, PartialEq)]
pub struct PictureRecord {
    /// Unique database ID
    pub id: i64,
    /// Absolute path of the picture file; unique key
    pub path: String,
    /// md5 hex digest of the file content at last observation
    pub fingerprint: String,
    /// Capture timestamp "YYYY-MM-DD HH:MM:SS"; may be empty
    pub creation_time: String,
    /// Derived artifact name "{fingerprint}.jpg", or empty while no
    /// thumbnail has been built yet
    pub cached_name: String,
}

/// What one reconciliation cycle did to the catalog.
///
/// `added` is derived telemetry (new-on-disk count minus moved count) and
/// can go negative when a cleanup-only run classifies moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicturesChanges {
    pub removed: usize,
    pub moved: usize,
    pub added: i64,
}

/// Events the pipeline reports to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Scan finished; number of qualifying files found under the root
    ScannedCount(usize),
    /// Whether thumbnail work is needed this cycle
    CacheNeeded(bool),
    /// Nothing changed since the previous cycle
    NoChange,
    /// Cleanup finished; removed/moved/added summary
    Changes(PicturesChanges),
    /// One worklist file was processed; percent covers the whole worklist
    BuildProgress { path: String, percent: u8 },
    /// All build workers reported; number of thumbnails converted this run
    BuildDone(usize),
}

/// Typed settings values and their defaults
///
/// Structured settings are serialized to JSON and stored in the settings
/// table of the catalog database.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Last known window placement of the presentation layer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    /// Convert to JSON string for database storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string (from database)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Default worker count: half of the logical processors, minimum 1.
pub fn default_thread_count() -> usize {
    (num_cpus::get() / 2).max(1)
}

/// The system Pictures folder, used until the user configures an album
/// root of their own.
pub fn default_pictures_folder() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join("Pictures"))
}

/// State management module
///
/// This module handles everything persisted between runs, including:
/// - The catalog database and its queries (library.rs)
/// - Shared data structures (data.rs)
/// - Typed application settings stored in the catalog (settings.rs)

pub mod data;
pub mod library;
pub mod settings;

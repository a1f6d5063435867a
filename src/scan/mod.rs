/// Folder scanning module
///
/// This module finds the pictures beneath a root folder:
/// - File identity: content fingerprints and extension tags (identity.rs)
/// - Work partitioning shared with the cache builder (partition.rs)
/// - The multi-worker recursive scanner itself (scanner.rs)

pub mod identity;
pub mod partition;
pub mod scanner;

pub mod error;
pub mod exporter;
pub mod file_ops;
pub mod filter;
pub mod folder_tree;
pub mod ignore;
pub mod metadata;
pub mod search_worker;
pub mod selection;
pub mod walk;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single file found by the search worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    /// Modification time in Unix seconds, `None` if it could not be read.
    pub modified: Option<i64>,
    pub size: u64,
}

impl FileEntry {
    /// Builds an entry from a path, reading its metadata.
    pub fn from_path(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(md) => Self::new(path, Some(&md)),
            Err(e) => {
                tracing::debug!(path = %path.display(), "stat failed: {}", e);
                Self::new(path, None)
            }
        }
    }

    /// Builds an entry from already fetched metadata.
    ///
    /// Missing metadata still yields an entry (with unknown mtime and zero size)
    /// so that a single unreadable file never aborts a search.
    pub fn new(path: &Path, metadata: Option<&std::fs::Metadata>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            name,
            is_directory: metadata.is_some_and(|md| md.is_dir()),
            modified: metadata
                .and_then(|md| md.modified().ok())
                .and_then(system_time_to_unix),
            size: metadata.map_or(0, |md| md.len()),
        }
    }
}

/// A node of the folder tree, stored flat like the scan produces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub path: PathBuf,
    pub is_directory: bool,
    pub size: u64,
    pub modified: Option<i64>,
    /// Depth below the root folder; the root itself has depth 0.
    pub depth: usize,
    pub parent: Option<PathBuf>,
    /// Index of the root folder this item belongs to.
    pub root_index: usize,
    /// Set for directories whose contents could not be listed.
    pub error: Option<String>,
}

/// Converts a `SystemTime` into Unix seconds.
pub fn system_time_to_unix(time: std::time::SystemTime) -> Option<i64> {
    match time.duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).ok(),
        Err(e) => i64::try_from(e.duration().as_secs()).ok().map(|s| -s),
    }
}

pub use error::{CoreError, CoreResult};
pub use exporter::{ConflictPolicy, ExportProgress, ExportReport, Exporter};
pub use filter::{AttributeFilter, SearchFilter, TimeRange};
pub use folder_tree::{FolderTree, TreeOptions};
pub use metadata::MetadataTable;
pub use search_worker::{SearchEvent, SearchOptions, SearchSummary, SearchWorker};
pub use selection::{CheckState, SelectionCounts, SelectionModel, TreeIndex};

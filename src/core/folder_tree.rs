//! Loads the folder hierarchy shown in the tree view.
//!
//! Every load is a full re-walk of all roots; the result is a flat, pre-ordered
//! list of `FileItem`s (each directory directly followed by its sorted children).

use super::selection::TreeIndex;
use super::walk::{build_walker, classify, EntryKind};
use super::{system_time_to_unix, CoreError, CoreResult, FileItem};
use std::cmp::Ordering as CmpOrdering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Include entries whose name starts with a dot.
    pub show_hidden: bool,
    pub exclude_patterns: Vec<String>,
}

/// The loaded folder hierarchy for a set of roots.
#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    pub roots: Vec<PathBuf>,
    pub items: Vec<FileItem>,
}

impl FolderTree {
    /// Lists every root recursively.
    ///
    /// Unreadable directories do not fail the load: they are kept as items with
    /// `error` set and no children.
    pub fn scan(roots: &[PathBuf], options: &TreeOptions, cancel: &AtomicBool) -> CoreResult<Self> {
        let mut items = Vec::new();

        for (root_index, root) in roots.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return Err(CoreError::Cancelled);
            }
            let mut root_item = FileItem {
                path: root.clone(),
                is_directory: true,
                size: 0,
                modified: modified_of(root),
                depth: 0,
                parent: None,
                root_index,
                error: None,
            };
            if !root.is_dir() {
                root_item.error = Some("Folder not found".to_string());
                items.push(root_item);
                continue;
            }
            items.push(root_item);
            walk_root(root, root_index, options, cancel, &mut items)?;
        }

        tracing::info!(roots = roots.len(), items = items.len(), "📂 Folder tree loaded");
        Ok(Self {
            roots: roots.to_vec(),
            items,
        })
    }

    pub fn index(&self) -> TreeIndex {
        TreeIndex::from_items(&self.roots, &self.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Appends everything below `root` in pre-order.
fn walk_root(
    root: &Path,
    root_index: usize,
    options: &TreeOptions,
    cancel: &AtomicBool,
    items: &mut Vec<FileItem>,
) -> CoreResult<()> {
    let mut builder = build_walker(root, &options.exclude_patterns, options.show_hidden);
    builder.sort_by_file_path(folders_first);

    for result in builder.build() {
        if cancel.load(Ordering::Relaxed) {
            return Err(CoreError::Cancelled);
        }
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                record_walk_error(&e, items);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let (kind, metadata) = classify(&entry);
        if kind == EntryKind::Other {
            tracing::debug!(path = %entry.path().display(), "Skipping entry that is neither file nor folder");
            continue;
        }
        let path = entry.path();
        items.push(FileItem {
            path: path.to_path_buf(),
            is_directory: kind == EntryKind::Dir,
            size: metadata.as_ref().map_or(0, |md| md.len()),
            modified: metadata
                .as_ref()
                .and_then(|md| md.modified().ok())
                .and_then(system_time_to_unix),
            depth: entry.depth(),
            parent: path.parent().map(Path::to_path_buf),
            root_index,
            error: None,
        });
    }
    Ok(())
}

/// Folders first, then files, each case-insensitively by name.
fn folders_first(a: &Path, b: &Path) -> CmpOrdering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    };
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| name(a).cmp(&name(b)))
}

/// Attaches a listing error to the folder it belongs to.
fn record_walk_error(err: &ignore::Error, items: &mut [FileItem]) {
    tracing::warn!("Cannot list folder: {}", err);
    let ignore::Error::WithPath { path, .. } = err else {
        return;
    };
    if let Some(item) = items.iter_mut().rev().find(|i| &i.path == path) {
        item.error = Some(match err.io_error() {
            Some(io_err) => describe_io_error(io_err),
            None => format!("Error: {err}"),
        });
    }
}

fn modified_of(path: &Path) -> Option<i64> {
    fs::metadata(path)
        .ok()
        .and_then(|md| md.modified().ok())
        .and_then(system_time_to_unix)
}

fn describe_io_error(e: &std::io::Error) -> String {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        std::io::ErrorKind::NotFound => "Folder not found".to_string(),
        _ => format!("Error: {e}"),
    }
}

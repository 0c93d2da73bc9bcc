//! The directory walker shared by the folder tree and the search.
//!
//! Both walk with the same rules so that every file listed in the tree is
//! also searched: symlinks are not descended into, but a link counts as
//! whatever it points to.

use super::ignore::{build_exclude_matcher, is_excluded};
use ignore::{DirEntry, WalkBuilder};
use std::fs;
use std::path::Path;

/// What a walked entry is, looking through symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Broken links, sockets, devices and the like.
    Other,
}

/// Builds a walker over `root`.
///
/// `.gitignore` files are not honored; hidden entries are skipped unless
/// `include_hidden` is set, and the user's exclude patterns prune whole
/// subtrees. The root itself is never filtered.
pub fn build_walker(root: &Path, exclude_patterns: &[String], include_hidden: bool) -> WalkBuilder {
    let matcher = build_exclude_matcher(root, exclude_patterns);
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            if !include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
                return false;
            }
            let is_dir = match entry.file_type() {
                Some(ft) if ft.is_symlink() => entry.path().is_dir(),
                Some(ft) => ft.is_dir(),
                None => false,
            };
            !is_excluded(&matcher, entry.path(), is_dir)
        });
    builder
}

/// Classifies `entry` and returns its metadata, following a symlink to its target.
pub fn classify(entry: &DirEntry) -> (EntryKind, Option<fs::Metadata>) {
    let metadata = if entry.path_is_symlink() {
        fs::metadata(entry.path()).ok()
    } else {
        entry.metadata().ok()
    };
    let kind = match &metadata {
        Some(md) if md.is_dir() => EntryKind::Dir,
        Some(md) if md.is_file() => EntryKind::File,
        _ => EntryKind::Other,
    };
    (kind, metadata)
}

/// `true` for regular files and for symlinks pointing at one.
///
/// Cheaper than `classify` for plain entries since it only stats links.
pub fn is_file_entry(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Some(ft) if ft.is_file() => true,
        Some(ft) if ft.is_symlink() => entry.path().is_file(),
        _ => false,
    }
}

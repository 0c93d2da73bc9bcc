//! Tri-state selection shared by the folder tree and the result list.
//!
//! Only file paths are stored. A folder's state is always derived from the
//! files below it, so the tree and the list can never disagree.

use super::FileItem;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Unchecked,
    Partial,
    Checked,
}

/// Parent/child relationships of a loaded `FolderTree`.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    pub roots: Vec<PathBuf>,
    pub children: HashMap<PathBuf, Vec<PathBuf>>,
    pub dirs: HashSet<PathBuf>,
    pub files: HashSet<PathBuf>,
    /// Every path in pre-order, parents before children.
    order: Vec<PathBuf>,
}

impl TreeIndex {
    pub fn from_items(roots: &[PathBuf], items: &[FileItem]) -> Self {
        let mut index = Self {
            roots: roots.to_vec(),
            ..Default::default()
        };
        for item in items {
            if item.is_directory {
                index.dirs.insert(item.path.clone());
                index.children.entry(item.path.clone()).or_default();
            } else {
                index.files.insert(item.path.clone());
            }
            if let Some(parent) = &item.parent {
                index
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(item.path.clone());
            }
            index.order.push(item.path.clone());
        }
        index
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    /// All files anywhere below `dir`.
    pub fn descendant_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            let Some(children) = self.children.get(&current) else {
                continue;
            };
            for child in children {
                if self.dirs.contains(child) {
                    stack.push(child.clone());
                } else {
                    files.push(child.clone());
                }
            }
        }
        files
    }
}

/// Number of fully checked folders and of checked files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionCounts {
    pub folders: usize,
    pub files: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    checked: HashSet<PathBuf>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks or unchecks a file, or every file below a folder.
    ///
    /// Paths not present in the tree (e.g. hidden files found by a search)
    /// are treated as files.
    pub fn set_checked(&mut self, index: &TreeIndex, path: &Path, checked: bool) {
        if index.is_dir(path) {
            let files = index.descendant_files(path);
            self.set_many(&files, checked);
        } else if checked {
            self.checked.insert(path.to_path_buf());
        } else {
            self.checked.remove(path);
        }
    }

    /// A checked item becomes unchecked; unchecked and partial items become checked.
    pub fn toggle(&mut self, index: &TreeIndex, path: &Path) {
        let checked = self.state_of(index, path) != CheckState::Checked;
        self.set_checked(index, path, checked);
    }

    pub fn set_all(&mut self, index: &TreeIndex, checked: bool) {
        if checked {
            self.checked.extend(index.files.iter().cloned());
        } else {
            self.checked.retain(|p| !index.files.contains(p));
        }
    }

    pub fn set_many(&mut self, paths: &[PathBuf], checked: bool) {
        if checked {
            self.checked.extend(paths.iter().cloned());
        } else {
            for path in paths {
                self.checked.remove(path);
            }
        }
    }

    pub fn is_checked(&self, path: &Path) -> bool {
        self.checked.contains(path)
    }

    pub fn state_of(&self, index: &TreeIndex, path: &Path) -> CheckState {
        if !index.is_dir(path) {
            return if self.checked.contains(path) {
                CheckState::Checked
            } else {
                CheckState::Unchecked
            };
        }
        let files = index.descendant_files(path);
        let selected = files.iter().filter(|f| self.checked.contains(*f)).count();
        derive_state(selected, files.len())
    }

    /// States for every path in the tree, computed in one bottom-up pass.
    pub fn compute_states(&self, index: &TreeIndex) -> HashMap<PathBuf, CheckState> {
        // (checked files, total files) below each directory
        let mut tallies: HashMap<&Path, (usize, usize)> = HashMap::with_capacity(index.dirs.len());
        let mut states = HashMap::with_capacity(index.order.len());

        for path in index.order.iter().rev() {
            if index.dirs.contains(path) {
                let (selected, total) = index
                    .children
                    .get(path)
                    .map(|children| {
                        children.iter().fold((0, 0), |(s, t), child| {
                            if let Some((cs, ct)) = tallies.get(child.as_path()) {
                                (s + cs, t + ct)
                            } else {
                                (s + usize::from(self.checked.contains(child)), t + 1)
                            }
                        })
                    })
                    .unwrap_or((0, 0));
                tallies.insert(path.as_path(), (selected, total));
                states.insert(path.clone(), derive_state(selected, total));
            } else {
                let state = if self.checked.contains(path) {
                    CheckState::Checked
                } else {
                    CheckState::Unchecked
                };
                states.insert(path.clone(), state);
            }
        }
        states
    }

    pub fn counts(&self, index: &TreeIndex) -> SelectionCounts {
        let folders = self
            .compute_states(index)
            .iter()
            .filter(|(path, state)| index.is_dir(path) && **state == CheckState::Checked)
            .count();
        SelectionCounts {
            folders,
            files: self.checked.len(),
        }
    }

    /// Checked files in path order.
    pub fn files_for_export(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.checked.iter().cloned().collect();
        files.sort();
        files.dedup();
        files
    }

    /// Drops checked paths that no longer exist on disk or no longer lie
    /// below one of `roots`. Returns how many were removed.
    pub fn retain_existing(&mut self, roots: &[PathBuf]) -> usize {
        let before = self.checked.len();
        self.checked
            .retain(|p| roots.iter().any(|root| p.starts_with(root)) && p.exists());
        let removed = before - self.checked.len();
        if removed > 0 {
            tracing::info!(removed, "Dropped stale paths from the selection");
        }
        removed
    }

    pub fn has_selection(&self) -> bool {
        !self.checked.is_empty()
    }

    pub fn clear(&mut self) {
        self.checked.clear();
    }

    pub fn len(&self) -> usize {
        self.checked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }
}

fn derive_state(selected: usize, total: usize) -> CheckState {
    if total == 0 || selected == 0 {
        CheckState::Unchecked
    } else if selected == total {
        CheckState::Checked
    } else {
        CheckState::Partial
    }
}

//! Responsible for transforming the `AppState` into a `UiState` view model.
//!
//! This module acts as a presentation layer, preparing data specifically for consumption
//! by the UI. It builds the folder tree with its check states, the result list rows
//! and the metadata combo options.

use crate::config::AppConfig;
use crate::core::{CheckState, FileItem, SelectionCounts};
use crate::utils::file_kind::FileKind;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::events::SearchProgressView;
use super::filtering::{display_path, FilterInput};
use super::state::AppState;

/// A serializable representation of the application state for the UI.
#[derive(Serialize, Clone, Debug)]
pub struct UiState {
    pub config: AppConfig,
    pub roots: Vec<PathBuf>,
    pub tree: Vec<TreeNode>,
    pub results: Vec<ResultItem>,
    pub checked_result_count: usize,
    pub filter: FilterInput,
    pub metadata: Option<MetadataView>,
    pub counts: SelectionCounts,
    pub search_progress: SearchProgressView,
    pub is_loading_tree: bool,
    pub is_searching: bool,
    pub is_exporting: bool,
    pub can_export: bool,
    pub status_message: String,
    pub previewed_path: Option<PathBuf>,
}

/// A serializable representation of a single node in the folder tree for the UI.
///
/// Children are only included for expanded folders.
#[derive(Serialize, Clone, Debug)]
pub struct TreeNode {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub size: u64,
    pub modified: Option<i64>,
    pub check_state: CheckState,
    pub is_expanded: bool,
    pub has_children: bool,
    pub is_previewed: bool,
    pub error: Option<String>,
    pub children: Vec<TreeNode>,
}

/// One row of the search result list.
#[derive(Serialize, Clone, Debug)]
pub struct ResultItem {
    pub path: PathBuf,
    pub display_path: String,
    pub kind: FileKind,
    pub icon: &'static str,
    pub size: u64,
    pub modified: Option<i64>,
    pub checked: bool,
}

/// The spreadsheet-driven combo boxes.
#[derive(Serialize, Clone, Debug)]
pub struct MetadataView {
    pub source: PathBuf,
    pub categories: Vec<String>,
    pub selected_category: Option<usize>,
    pub models: Vec<String>,
    pub apns: Vec<String>,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let tree = if state.is_loading_tree {
        Vec::new()
    } else {
        build_tree_nodes(state)
    };

    let results: Vec<ResultItem> = state
        .results
        .iter()
        .map(|entry| {
            let kind = FileKind::from_path(&entry.path, entry.is_directory);
            ResultItem {
                path: entry.path.clone(),
                display_path: display_path(&entry.path, &state.roots),
                kind,
                icon: kind.icon(),
                size: entry.size,
                modified: entry.modified,
                checked: state.selection.is_checked(&entry.path),
            }
        })
        .collect();
    let checked_result_count = results.iter().filter(|r| r.checked).count();

    let metadata = state.metadata.as_ref().map(|table| {
        let (models, apns) = state
            .selected_category
            .map(|i| table.options_for(i))
            .unwrap_or_default();
        MetadataView {
            source: table.source.clone(),
            categories: table.categories.clone(),
            selected_category: state.selected_category,
            models: models.to_vec(),
            apns: apns.to_vec(),
        }
    });

    UiState {
        config: state.config.clone(),
        roots: state.roots.clone(),
        tree,
        results,
        checked_result_count,
        filter: state.filter_input.clone(),
        metadata,
        counts: state.selection.counts(&state.tree_index),
        search_progress: state.search_progress.clone(),
        is_loading_tree: state.is_loading_tree,
        is_searching: state.is_searching,
        is_exporting: state.is_exporting,
        can_export: state.selection.has_selection() && !state.is_exporting,
        status_message: state.status_message.clone(),
        previewed_path: state.previewed_path.clone(),
    }
}

/// Builds the nested `TreeNode` structure from the flat, pre-ordered tree items.
fn build_tree_nodes(state: &AppState) -> Vec<TreeNode> {
    let items: HashMap<&Path, &FileItem> = state
        .tree
        .items
        .iter()
        .map(|item| (item.path.as_path(), item))
        .collect();
    let check_states = state.selection.compute_states(&state.tree_index);

    fn build_node(
        path: &Path,
        state: &AppState,
        items: &HashMap<&Path, &FileItem>,
        check_states: &HashMap<PathBuf, CheckState>,
    ) -> Option<TreeNode> {
        let item = items.get(path)?;
        let child_paths = state.tree_index.children.get(path);
        let has_children = child_paths.is_some_and(|c| !c.is_empty());
        let is_expanded = item.is_directory && state.expanded_dirs.contains(path);

        let children = match child_paths {
            Some(paths) if is_expanded => paths
                .iter()
                .filter_map(|p| build_node(p, state, items, check_states))
                .collect(),
            _ => Vec::new(),
        };

        // Roots like `/` have no file name.
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Some(TreeNode {
            name,
            path: path.to_path_buf(),
            is_directory: item.is_directory,
            size: item.size,
            modified: item.modified,
            check_state: check_states
                .get(path)
                .copied()
                .unwrap_or(CheckState::Unchecked),
            is_expanded,
            has_children,
            is_previewed: state.previewed_path.as_deref() == Some(path),
            error: item.error.clone(),
            children,
        })
    }

    state
        .tree
        .roots
        .iter()
        .filter_map(|root| build_node(root, state, &items, &check_states))
        .collect()
}

/// Paths of all folders in the loaded tree, used by "expand all".
pub fn all_directories(state: &AppState) -> Vec<PathBuf> {
    state.tree_index.dirs.iter().cloned().collect()
}

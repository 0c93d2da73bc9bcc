//! Defines the central, mutable state of the application.

use super::events::{PreviewPayload, SearchProgressView};
use super::filtering::FilterInput;
use crate::config::AppConfig;
use crate::core::{FileEntry, FolderTree, MetadataTable, SelectionModel, TreeIndex};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` to allow for safe, shared access
/// from different threads (e.g., the main event loop, IPC handlers, and async tasks).
pub struct AppState {
    pub config: AppConfig,
    /// Where `persist_config` writes; `None` means the platform default.
    pub config_path: Option<PathBuf>,
    /// The root folders shown in the tree and searched, in display order.
    pub roots: Vec<PathBuf>,
    pub tree: FolderTree,
    pub tree_index: TreeIndex,
    pub expanded_dirs: HashSet<PathBuf>,
    /// Checked files, shared by the tree and the result list.
    pub selection: SelectionModel,
    /// Matches of the current search, in the order they were found.
    pub results: Vec<FileEntry>,
    pub filter_input: FilterInput,
    pub metadata: Option<MetadataTable>,
    pub selected_category: Option<usize>,
    pub preview: PreviewPayload,
    pub previewed_path: Option<PathBuf>,
    pub status_message: String,

    pub is_loading_tree: bool,
    pub tree_task: Option<JoinHandle<()>>,
    pub tree_cancellation_flag: Arc<AtomicBool>,

    pub is_searching: bool,
    /// Incremented for every search; events of older searches are dropped.
    pub search_id: u64,
    pub search_progress: SearchProgressView,
    /// When matches of the running search were last pushed to the UI.
    pub results_notified_at: Option<Instant>,
    pub search_task: Option<JoinHandle<()>>,
    pub search_cancellation_flag: Arc<AtomicBool>,

    pub is_exporting: bool,
    pub export_task: Option<JoinHandle<()>>,
    pub export_cancellation_flag: Arc<AtomicBool>,
}

impl Default for AppState {
    /// Creates a default `AppState` instance, loading the configuration from disk.
    fn default() -> Self {
        Self::with_config(AppConfig::load().unwrap_or_default())
    }
}

impl AppState {
    pub fn with_config(config: AppConfig) -> Self {
        let filter_input = FilterInput::with_default_window(config.default_time_window_days);
        Self {
            config,
            config_path: None,
            roots: Vec::new(),
            tree: FolderTree::default(),
            tree_index: TreeIndex::default(),
            expanded_dirs: HashSet::new(),
            selection: SelectionModel::new(),
            results: Vec::new(),
            filter_input,
            metadata: None,
            selected_category: None,
            preview: PreviewPayload::Empty,
            previewed_path: None,
            status_message: "Ready.".to_string(),
            is_loading_tree: false,
            tree_task: None,
            tree_cancellation_flag: Arc::new(AtomicBool::new(false)),
            is_searching: false,
            search_id: 0,
            search_progress: SearchProgressView::default(),
            results_notified_at: None,
            search_task: None,
            search_cancellation_flag: Arc::new(AtomicBool::new(false)),
            is_exporting: false,
            export_task: None,
            export_cancellation_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancels the running tree load, if any.
    pub fn cancel_tree_load(&mut self) {
        self.tree_cancellation_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.tree_task.take() {
            handle.abort();
        }
        self.is_loading_tree = false;
    }

    /// Cancels the running search and invalidates its pending events.
    ///
    /// Returns `true` if a search was actually running.
    pub fn cancel_current_search(&mut self) -> bool {
        self.search_cancellation_flag.store(true, Ordering::SeqCst);
        let was_running = self.is_searching;
        if let Some(handle) = self.search_task.take() {
            handle.abort();
        }
        self.search_id += 1;
        self.is_searching = false;
        self.search_progress.running = false;
        if was_running {
            tracing::info!("🛑 Search cancelled");
        }
        was_running
    }

    /// Cancels the running export, if any.
    pub fn cancel_current_export(&mut self) {
        self.export_cancellation_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.export_task.take() {
            handle.abort();
        }
        self.is_exporting = false;
    }

    /// Starts a fresh search generation: cancels the old one, clears the
    /// result list and returns the new id together with a new cancel flag.
    pub fn begin_search(&mut self) -> (u64, Arc<AtomicBool>) {
        self.cancel_current_search();
        self.results.clear();
        self.results_notified_at = None;
        let flag = Arc::new(AtomicBool::new(false));
        self.search_cancellation_flag = flag.clone();
        self.search_progress = SearchProgressView {
            search_id: self.search_id,
            ..Default::default()
        };
        (self.search_id, flag)
    }

    /// `true` if events tagged with `search_id` still belong to the current search.
    pub fn is_current_search(&self, search_id: u64) -> bool {
        self.search_id == search_id
    }

    /// Adds roots that are not already present. Returns how many were added.
    ///
    /// A folder inside an existing root is already covered and is skipped; a
    /// folder containing existing roots replaces them.
    pub fn add_roots(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> usize {
        let mut added = 0;
        for path in paths {
            if !path.is_dir() {
                tracing::warn!(path = %path.display(), "Ignoring root that is not a folder");
                continue;
            }
            if let Some(covering) = self.roots.iter().find(|r| path.starts_with(r)) {
                tracing::info!(
                    path = %path.display(),
                    root = %covering.display(),
                    "Folder is already covered by a root"
                );
                continue;
            }
            let before = self.roots.len();
            self.roots.retain(|r| !r.starts_with(&path));
            if self.roots.len() != before {
                tracing::info!(path = %path.display(), "New root replaces nested roots");
            }
            self.expanded_dirs.insert(path.clone());
            self.roots.push(path);
            added += 1;
        }
        self.config.last_roots = self.roots.clone();
        added
    }

    /// Removes a root together with everything that referred to its contents.
    pub fn remove_root(&mut self, path: &Path) -> bool {
        let before = self.roots.len();
        self.roots.retain(|r| r != path);
        self.config.last_roots = self.roots.clone();
        if before == self.roots.len() {
            return false;
        }
        let roots = self.roots.clone();
        self.selection.retain_existing(&roots);
        self.results.retain(|r| !r.path.starts_with(path));
        self.expanded_dirs.retain(|d| !d.starts_with(path));
        if self.previewed_path.as_ref().is_some_and(|p| p.starts_with(path)) {
            self.previewed_path = None;
            self.preview = PreviewPayload::Empty;
        }
        true
    }

    /// Writes the current configuration; failures are only logged.
    pub fn persist_config(&self) {
        if let Err(e) = crate::config::settings::save_config(&self.config, self.config_path.as_deref()) {
            tracing::warn!("Failed to save config: {}", e);
        }
    }

    /// Stops every background task, e.g. before the window closes.
    pub fn shutdown(&mut self) {
        self.cancel_tree_load();
        self.cancel_current_search();
        self.cancel_current_export();
    }
}

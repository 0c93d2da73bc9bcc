//! Background work started by the command handlers.
//!
//! Every blocking walk runs in `spawn_blocking`. Results are applied to the
//! shared state only if the task has not been superseded in the meantime.

use base64::{engine::general_purpose, Engine as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::events::{PreviewPayload, UserEvent};
use super::helpers::{lock_state, notify};
use super::proxy::EventProxy;
use super::state::AppState;

use crate::core::{
    CoreError, Exporter, FolderTree, MetadataTable, SearchEvent, SearchFilter, SearchOptions,
    SearchWorker, TreeOptions,
};
use crate::utils::file_kind::{has_pdf_signature, FileKind};

/// Minimum gap between two result list pushes while a search is running.
const RESULTS_NOTIFY_INTERVAL: Duration = Duration::from_millis(100);

/// Re-walks all roots for the tree view, then re-runs the current search.
///
/// Checked paths that disappeared from disk are dropped from the selection.
pub fn start_tree_load<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let mut state_guard = lock_state(&state);
    state_guard.cancel_tree_load();

    let cancel_flag = Arc::new(AtomicBool::new(false));
    state_guard.tree_cancellation_flag = cancel_flag.clone();
    state_guard.is_loading_tree = true;
    state_guard.status_message = "Loading folders...".to_string();

    let roots = state_guard.roots.clone();
    let options = TreeOptions {
        show_hidden: state_guard.config.show_hidden_in_tree,
        exclude_patterns: state_guard.config.exclude_patterns.clone(),
    };
    notify(&state_guard, &proxy);

    let task_proxy = proxy.clone();
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let scan_flag = cancel_flag.clone();
        let result =
            tokio::task::spawn_blocking(move || FolderTree::scan(&roots, &options, &scan_flag)).await;

        {
            let mut s = lock_state(&task_state);
            if cancel_flag.load(Ordering::SeqCst) {
                tracing::debug!("Discarding superseded tree load");
                return;
            }
            s.is_loading_tree = false;
            s.tree_task = None;

            match result {
                Ok(Ok(tree)) => {
                    s.tree_index = tree.index();
                    s.tree = tree;
                    let roots = s.roots.clone();
                    s.selection.retain_existing(&roots);
                    s.expanded_dirs.retain(|p| p.exists());
                    s.status_message = format!(
                        "Loaded {} folders, {} files.",
                        s.tree_index.dirs.len(),
                        s.tree_index.files.len()
                    );
                }
                Ok(Err(CoreError::Cancelled)) => return,
                Ok(Err(e)) => {
                    tracing::error!("Tree load failed: {}", e);
                    s.status_message = format!("Failed to load folders: {e}");
                    task_proxy.send_event(UserEvent::ShowError(s.status_message.clone()));
                }
                Err(e) => {
                    tracing::error!("Tree load task failed: {}", e);
                    s.status_message = format!("Failed to load folders: {e}");
                }
            }
            notify(&s, &task_proxy);
        }

        start_search(task_proxy, task_state);
    });
    state_guard.tree_task = Some(handle);
}

/// Starts a new search for the current filter inputs.
///
/// The previous search is cancelled and the result list cleared. Without
/// roots or without any filter condition no search is started.
pub fn start_search<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let mut state_guard = lock_state(&state);
    let (search_id, cancel_flag) = state_guard.begin_search();
    let filter = state_guard.filter_input.to_search_filter();

    if state_guard.roots.is_empty() || !filter.has_any_condition() {
        state_guard.status_message = if state_guard.roots.is_empty() {
            "Add a folder to start searching.".to_string()
        } else {
            "Enter a search condition.".to_string()
        };
        proxy.send_event(UserEvent::SearchProgress(state_guard.search_progress.clone()));
        notify(&state_guard, &proxy);
        return;
    }

    state_guard.is_searching = true;
    state_guard.search_progress.running = true;
    state_guard.status_message = "Searching...".to_string();
    notify(&state_guard, &proxy);

    let roots = state_guard.roots.clone();
    let options = SearchOptions {
        result_batch_size: state_guard.config.result_batch_size,
        progress_interval: state_guard.config.progress_interval,
        exclude_patterns: state_guard.config.exclude_patterns.clone(),
    };
    let debounce = Duration::from_millis(state_guard.config.search_debounce_ms);

    let handle = tokio::spawn(run_search_task(
        proxy.clone(),
        state.clone(),
        search_id,
        cancel_flag,
        roots,
        filter,
        options,
        debounce,
    ));
    state_guard.search_task = Some(handle);
}

#[allow(clippy::too_many_arguments)]
async fn run_search_task<P: EventProxy>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    search_id: u64,
    cancel_flag: Arc<AtomicBool>,
    roots: Vec<PathBuf>,
    filter: SearchFilter,
    options: SearchOptions,
    debounce: Duration,
) {
    // Rapid typing starts many searches; only the last one gets past the wait.
    if !debounce.is_zero() {
        tokio::time::sleep(debounce).await;
    }
    if cancel_flag.load(Ordering::SeqCst) {
        return;
    }

    tracing::info!(search_id, roots = roots.len(), "Search started");
    let worker = SearchWorker::new(roots, &filter, options);
    let event_proxy = proxy.clone();
    let event_state = state.clone();
    let worker_flag = cancel_flag.clone();
    let result = tokio::task::spawn_blocking(move || {
        worker.run(&worker_flag, |event| {
            apply_search_event(&event_proxy, &event_state, search_id, event)
        })
    })
    .await;

    let mut s = lock_state(&state);
    if !s.is_current_search(search_id) {
        tracing::debug!(search_id, "Discarding result of superseded search");
        return;
    }
    s.is_searching = false;
    s.search_task = None;
    s.search_progress.running = false;

    match result {
        Ok(Ok(summary)) => {
            tracing::info!(
                search_id,
                matched = summary.matched,
                processed = summary.processed,
                "✅ Search finished"
            );
            s.search_progress.processed = summary.processed;
            s.search_progress.total = summary.total;
            s.search_progress.matched = summary.matched;
            s.status_message = format!(
                "Found {} matching files ({} files searched).",
                summary.matched, summary.processed
            );
        }
        Ok(Err(CoreError::Cancelled)) => {
            s.status_message = "Search cancelled.".to_string();
        }
        Ok(Err(e)) => {
            tracing::error!("Search failed: {}", e);
            s.status_message = format!("Search failed: {e}");
            proxy.send_event(UserEvent::ShowError(s.status_message.clone()));
        }
        Err(e) => {
            tracing::error!("Search task failed: {}", e);
            s.status_message = format!("Search failed: {e}");
        }
    }
    proxy.send_event(UserEvent::SearchProgress(s.search_progress.clone()));
    notify(&s, &proxy);
}

/// Applies one event of a running search, unless a newer search has started.
fn apply_search_event<P: EventProxy>(
    proxy: &P,
    state: &Arc<Mutex<AppState>>,
    search_id: u64,
    event: SearchEvent,
) {
    let mut s = lock_state(state);
    if !s.is_current_search(search_id) {
        return;
    }
    match event {
        SearchEvent::Started { total } => {
            s.search_progress.total = total;
            proxy.send_event(UserEvent::SearchProgress(s.search_progress.clone()));
        }
        SearchEvent::Progress { processed, total } => {
            s.search_progress.processed = processed;
            s.search_progress.total = total;
            proxy.send_event(UserEvent::SearchProgress(s.search_progress.clone()));
        }
        SearchEvent::Matches(batch) => {
            tracing::debug!(search_id, batch = batch.len(), "Appending matches");
            s.results.extend(batch);
            s.search_progress.matched = s.results.len();
            // The final notify of the search task always shows the complete list.
            let due = match s.results_notified_at {
                Some(at) => at.elapsed() >= RESULTS_NOTIFY_INTERVAL,
                None => true,
            };
            if due {
                s.results_notified_at = Some(Instant::now());
                notify(&s, proxy);
            }
        }
    }
}

/// Loads the metadata spreadsheet and remembers it in the config.
pub fn start_metadata_load<P: EventProxy>(path: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    tokio::spawn(async move {
        let load_path = path.clone();
        let result = tokio::task::spawn_blocking(move || MetadataTable::load(&load_path)).await;

        let mut s = lock_state(&state);
        match result {
            Ok(Ok(table)) => {
                s.status_message = format!(
                    "Loaded {} categories from {}.",
                    table.categories.len(),
                    path.display()
                );
                s.metadata = Some(table);
                s.selected_category = None;
                s.config.last_spreadsheet = Some(path);
                s.persist_config();
            }
            Ok(Err(e)) => {
                tracing::error!(path = %path.display(), "Failed to load spreadsheet: {}", e);
                proxy.send_event(UserEvent::ShowError(format!("Could not load spreadsheet: {e}")));
            }
            Err(e) => {
                tracing::error!("Spreadsheet task failed: {}", e);
            }
        }
        notify(&s, &proxy);
    });
}

/// Copies the checked files to `destination` with progress events.
pub fn start_export<P: EventProxy>(destination: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    let mut state_guard = lock_state(&state);
    if state_guard.is_exporting {
        tracing::warn!("Export already running");
        return;
    }
    let files = state_guard.selection.files_for_export();
    if files.is_empty() {
        proxy.send_event(UserEvent::ShowError("No files selected for export.".to_string()));
        return;
    }

    let cancel_flag = Arc::new(AtomicBool::new(false));
    state_guard.export_cancellation_flag = cancel_flag.clone();
    state_guard.is_exporting = true;
    state_guard.status_message = format!("Exporting {} files...", files.len());
    state_guard.config.export_directory = Some(destination.clone());
    state_guard.persist_config();
    let policy = state_guard.config.conflict_policy;
    notify(&state_guard, &proxy);

    let task_proxy = proxy.clone();
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let progress_proxy = task_proxy.clone();
        let export_flag = cancel_flag.clone();
        let result = tokio::task::spawn_blocking(move || {
            Exporter::export(&files, &destination, policy, &export_flag, |progress| {
                progress_proxy.send_event(UserEvent::ExportProgress(progress));
            })
        })
        .await;

        let mut s = lock_state(&task_state);
        s.is_exporting = false;
        s.export_task = None;
        let (success, message) = match result {
            Ok(Ok(report)) => (report.is_success(), report.summary()),
            Ok(Err(e)) => (false, format!("Export failed: {e}")),
            Err(e) => (false, format!("Export failed: {e}")),
        };
        s.status_message = message.lines().next().unwrap_or_default().to_string();
        task_proxy.send_event(UserEvent::ExportComplete { success, message });
        notify(&s, &task_proxy);
    });
    state_guard.export_task = Some(handle);
}

/// Reads `path` for the preview pane.
pub fn start_preview<P: EventProxy>(path: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    let max_bytes = preview_limit_bytes(lock_state(&state).config.max_preview_mb);
    tokio::spawn(async move {
        let preview_path = path.clone();
        let payload = tokio::task::spawn_blocking(move || build_preview(&preview_path, max_bytes))
            .await
            .unwrap_or_else(|e| PreviewPayload::Unsupported {
                path: path.clone(),
                reason: format!("Preview failed: {e}"),
            });

        let mut s = lock_state(&state);
        // Another file may have been clicked while this one was loading.
        if s.previewed_path.as_deref() != Some(path.as_path()) {
            return;
        }
        s.preview = payload.clone();
        proxy.send_event(UserEvent::ShowPreview(payload));
    });
}

/// Converts the configured preview limit to bytes; huge values mean "no limit".
pub fn preview_limit_bytes(max_preview_mb: u64) -> u64 {
    max_preview_mb.saturating_mul(1024 * 1024)
}

/// PDFs up to `max_bytes` become a data URL; anything else is "unsupported".
pub fn build_preview(path: &Path, max_bytes: u64) -> PreviewPayload {
    let unsupported = |reason: String| PreviewPayload::Unsupported {
        path: path.to_path_buf(),
        reason,
    };

    if FileKind::from_path(path, path.is_dir()) != FileKind::Pdf {
        return unsupported("Preview is only available for PDF files.".to_string());
    }
    match std::fs::metadata(path) {
        Ok(md) if md.len() > max_bytes => {
            return unsupported(format!(
                "File is too large to preview ({} MB).",
                md.len() / (1024 * 1024)
            ));
        }
        Ok(_) => {}
        Err(e) => return unsupported(format!("Cannot read file: {e}")),
    }
    match has_pdf_signature(path) {
        Ok(true) => {}
        Ok(false) => return unsupported("File is not a valid PDF.".to_string()),
        Err(e) => return unsupported(format!("Cannot read file: {e}")),
    }
    match std::fs::read(path) {
        Ok(bytes) => PreviewPayload::Pdf {
            path: path.to_path_buf(),
            data_url: format!(
                "data:application/pdf;base64,{}",
                general_purpose::STANDARD.encode(bytes)
            ),
        },
        Err(e) => unsupported(format!("Cannot read file: {e}")),
    }
}

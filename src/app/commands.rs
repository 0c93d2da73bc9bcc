//! Contains all the command handlers that are callable from the frontend via IPC.
//!
//! Each function in this module corresponds to a specific `IpcMessage::command`.
//! These handlers are responsible for interacting with the `AppState` and the `core`
//! logic, and for sending `UserEvent`s back to the UI. A payload that does not
//! deserialize is logged and the command is ignored.

use super::events::{PreviewPayload, UserEvent};
use super::filtering::{ancestors_within_roots, FilterInput};
use super::helpers::{lock_state, notify, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::{
    start_export, start_metadata_load, start_preview, start_search, start_tree_load,
};
use super::view_model::all_directories;
use crate::app::file_dialog::DialogService;
use crate::config::AppConfig;
use crate::core::{file_ops, CoreResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

#[derive(Deserialize, Debug)]
struct CheckPayload {
    path: PathBuf,
    checked: bool,
}

#[derive(Deserialize, Debug)]
struct CreateFolderPayload {
    parent: PathBuf,
    name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RenamePayload {
    path: PathBuf,
    new_name: String,
}

fn parse_payload<T: DeserializeOwned>(payload: serde_json::Value, command: &str) -> Option<T> {
    match serde_json::from_value::<T>(payload.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(command, "Failed to deserialize payload {:?}: {}", payload, e);
            None
        }
    }
}

/// Sends the initial state and restores the last session's roots and spreadsheet.
pub fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let (has_roots, spreadsheet) = {
        let mut s = lock_state(&state);
        if s.roots.is_empty() && s.config.auto_load_last_roots {
            let last_roots = s.config.last_roots.clone();
            s.add_roots(last_roots);
        }
        let spreadsheet = s
            .config
            .last_spreadsheet
            .clone()
            .filter(|p| p.is_file() && s.metadata.is_none());
        notify(&s, &proxy);
        (!s.roots.is_empty(), spreadsheet)
    };

    if has_roots {
        start_tree_load(proxy.clone(), state.clone());
    }
    if let Some(path) = spreadsheet {
        start_metadata_load(path, proxy, state);
    }
}

/// Opens a dialog to pick one or more root folders and loads them.
pub fn select_folders<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let paths = dialog.pick_directories();
    if paths.is_empty() {
        tracing::info!("User cancelled folder selection.");
        return;
    }
    add_root_paths(paths, proxy, state);
}

/// Adds the given folders (e.g. dropped onto the window) as roots.
pub fn add_roots<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    if let Some(paths) = parse_payload::<Vec<PathBuf>>(payload, "addRoots") {
        add_root_paths(paths, proxy, state);
    }
}

pub fn add_root_paths<P: EventProxy>(paths: Vec<PathBuf>, proxy: P, state: Arc<Mutex<AppState>>) {
    let added = {
        let mut s = lock_state(&state);
        let added = s.add_roots(paths);
        if added > 0 {
            s.persist_config();
        }
        added
    };
    if added > 0 {
        tracing::info!(added, "Added root folders");
        start_tree_load(proxy, state);
    } else {
        proxy.send_event(UserEvent::ShowError(
            "No new folders were added.".to_string(),
        ));
    }
}

pub fn remove_root<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(path) = parse_payload::<PathBuf>(payload, "removeRoot") else {
        return;
    };
    let removed = {
        let mut s = lock_state(&state);
        let removed = s.remove_root(&path);
        if removed {
            s.persist_config();
        }
        removed
    };
    if removed {
        start_tree_load(proxy, state);
    }
}

/// Re-walks every root and re-runs the search.
pub fn refresh<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    start_tree_load(proxy, state);
}

/// Stores the new filter inputs and starts a (debounced) search.
pub fn update_filters<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    if let Some(input) = parse_payload::<FilterInput>(payload, "updateFilters") {
        lock_state(&state).filter_input = input;
        start_search(proxy, state);
    }
}

/// Cancels the running search; the matches found so far stay in the list.
pub fn cancel_search<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let mut s = lock_state(&state);
    if s.cancel_current_search() {
        s.status_message = "Search cancelled.".to_string();
    }
    proxy.send_event(UserEvent::SearchProgress(s.search_progress.clone()));
    notify(&s, &proxy);
}

/// Resets the date pickers to the default window and searches again.
pub fn reset_time_filter<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    {
        let mut s = lock_state(&state);
        let days = s.config.default_time_window_days;
        s.filter_input.reset_time_window(days);
    }
    start_search(proxy, state);
}

pub fn select_spreadsheet<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    match dialog.pick_spreadsheet() {
        Some(path) => start_metadata_load(path, proxy, state),
        None => tracing::info!("User cancelled spreadsheet selection."),
    }
}

/// Selects a category; its first model and APN become the current values.
pub fn select_category<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(index) = parse_payload::<Option<usize>>(payload, "selectCategory") else {
        return;
    };
    {
        let mut s = lock_state(&state);
        let s = &mut *s;
        let Some(table) = s.metadata.as_ref() else {
            tracing::warn!("selectCategory without a loaded spreadsheet");
            return;
        };
        match index.and_then(|i| table.categories.get(i).map(|c| (i, c.clone()))) {
            Some((i, category)) => {
                let (models, apns) = table.options_for(i);
                s.filter_input.category = category;
                s.filter_input.model = models.first().cloned().unwrap_or_default();
                s.filter_input.apn = apns.first().cloned().unwrap_or_default();
                s.selected_category = Some(i);
            }
            None => {
                s.selected_category = None;
                s.filter_input.category.clear();
                s.filter_input.model.clear();
                s.filter_input.apn.clear();
            }
        }
    }
    start_search(proxy, state);
}

pub fn open_spreadsheet_location<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let source = lock_state(&state).metadata.as_ref().map(|m| m.source.clone());
    match source {
        Some(path) => report_error(&proxy, file_ops::reveal_path(&path)),
        None => proxy.send_event(UserEvent::ShowError("No spreadsheet loaded.".to_string())),
    }
}

/// Checks or unchecks a tree item; folders apply to all their files.
pub fn set_tree_item_checked<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(p) = parse_payload::<CheckPayload>(payload, "setTreeItemChecked") {
        with_state_and_notify(&state, &proxy, |s| {
            s.selection.set_checked(&s.tree_index, &p.path, p.checked);
        });
    }
}

/// Checks or unchecks a result row. The tree reflects the same selection.
pub fn set_result_checked<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(p) = parse_payload::<CheckPayload>(payload, "setResultChecked") {
        with_state_and_notify(&state, &proxy, |s| {
            s.selection.set_many(&[p.path], p.checked);
        });
    }
}

pub fn set_all_tree<P: EventProxy>(checked: bool, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.selection.set_all(&s.tree_index, checked);
    });
}

/// Checks or unchecks every row currently in the result list.
pub fn set_all_results<P: EventProxy>(checked: bool, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        let paths: Vec<PathBuf> = s.results.iter().map(|r| r.path.clone()).collect();
        s.selection.set_many(&paths, checked);
    });
}

/// Toggles the expanded/collapsed state of a directory in the UI tree.
pub fn toggle_expansion<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(path) = parse_payload::<PathBuf>(payload, "toggleExpansion") {
        with_state_and_notify(&state, &proxy, |s| {
            if !s.expanded_dirs.remove(&path) {
                s.expanded_dirs.insert(path);
            }
        });
    }
}

/// Expands or collapses every folder of the tree.
pub fn expand_collapse_all<P: EventProxy>(
    payload: serde_json::Value,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(expand) = parse_payload::<bool>(payload, "expandCollapseAll") {
        with_state_and_notify(&state, &proxy, |s| {
            if expand {
                s.expanded_dirs = all_directories(s).into_iter().collect();
            } else {
                s.expanded_dirs.clear();
            }
        });
    }
}

/// Shows a file in the preview pane and reveals it in the tree.
pub fn preview_file<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(path) = parse_payload::<PathBuf>(payload, "previewFile") else {
        return;
    };
    with_state_and_notify(&state, &proxy, |s| {
        let ancestors = ancestors_within_roots(&path, &s.roots);
        s.expanded_dirs.extend(ancestors);
        s.previewed_path = Some(path.clone());
    });
    start_preview(path, proxy, state);
}

pub fn clear_preview<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.previewed_path = None;
        s.preview = PreviewPayload::Empty;
    });
    proxy.send_event(UserEvent::ShowPreview(PreviewPayload::Empty));
}

pub fn open_path<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    if let Some(path) = parse_payload::<PathBuf>(payload, "openPath") {
        report_error(&proxy, file_ops::open_path(&path));
    }
}

pub fn reveal_path<P: EventProxy>(payload: serde_json::Value, proxy: P) {
    if let Some(path) = parse_payload::<PathBuf>(payload, "revealPath") {
        report_error(&proxy, file_ops::reveal_path(&path));
    }
}

pub fn create_folder<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    if let Some(p) = parse_payload::<CreateFolderPayload>(payload, "createFolder") {
        match file_ops::create_folder(&p.parent, &p.name) {
            Ok(_) => {
                lock_state(&state).expanded_dirs.insert(p.parent);
                start_tree_load(proxy, state);
            }
            Err(e) => report_error::<P, ()>(&proxy, Err(e)),
        }
    }
}

/// Renames a file or folder; a checked file stays checked under its new name.
pub fn rename_path<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    if let Some(p) = parse_payload::<RenamePayload>(payload, "renamePath") {
        match file_ops::rename_path(&p.path, &p.new_name) {
            Ok(new_path) => {
                {
                    let mut s = lock_state(&state);
                    if s.selection.is_checked(&p.path) {
                        s.selection.set_many(&[p.path.clone()], false);
                        s.selection.set_many(&[new_path], true);
                    }
                    if s.previewed_path.as_ref() == Some(&p.path) {
                        s.previewed_path = None;
                    }
                }
                start_tree_load(proxy, state);
            }
            Err(e) => report_error::<P, ()>(&proxy, Err(e)),
        }
    }
}

pub fn delete_path<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    if let Some(path) = parse_payload::<PathBuf>(payload, "deletePath") {
        match file_ops::delete_path(&path) {
            Ok(()) => {
                {
                    let mut s = lock_state(&state);
                    if s.previewed_path.as_ref().is_some_and(|p| p.starts_with(&path)) {
                        s.previewed_path = None;
                        s.preview = PreviewPayload::Empty;
                        proxy.send_event(UserEvent::ShowPreview(PreviewPayload::Empty));
                    }
                }
                start_tree_load(proxy, state);
            }
            Err(e) => report_error::<P, ()>(&proxy, Err(e)),
        }
    }
}

/// Asks for a destination folder and copies all checked files there.
pub fn export_selected<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let start_dir = {
        let s = lock_state(&state);
        if !s.selection.has_selection() {
            proxy.send_event(UserEvent::ShowError(
                "No files selected for export.".to_string(),
            ));
            return;
        }
        s.config.export_directory.clone()
    };
    match dialog.pick_export_directory(start_dir.as_deref()) {
        Some(dest) => start_export(dest, proxy, state),
        None => tracing::info!("User cancelled export destination selection."),
    }
}

pub fn cancel_export<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        tracing::info!("Export cancellation requested.");
        // The task itself reports the partial result.
        s.export_cancellation_flag.store(true, Ordering::SeqCst);
    });
}

/// Updates the application configuration and persists it.
///
/// Changing what the tree shows (hidden entries, exclude patterns) reloads
/// the tree, which also re-runs the search.
pub fn update_config<P: EventProxy>(payload: serde_json::Value, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(new_config) = parse_payload::<AppConfig>(payload, "updateConfig") else {
        return;
    };
    let needs_reload = {
        let mut s = lock_state(&state);
        let needs_reload = s.config.show_hidden_in_tree != new_config.show_hidden_in_tree
            || s.config.exclude_patterns != new_config.exclude_patterns;
        // Roots are owned by the state, not by the settings form.
        let roots = s.config.last_roots.clone();
        s.config = AppConfig {
            last_roots: roots,
            ..new_config
        };
        s.persist_config();
        notify(&s, &proxy);
        needs_reload && !s.roots.is_empty()
    };
    if needs_reload {
        start_tree_load(proxy, state);
    }
}

fn report_error<P: EventProxy, T>(proxy: &P, result: CoreResult<T>) {
    if let Err(e) = result {
        tracing::warn!("Command failed: {}", e);
        proxy.send_event(UserEvent::ShowError(e.to_string()));
    }
}

//! The WebView application layer.
//!
//! The frontend sends `IpcMessage`s which are dispatched to `commands`; the
//! backend answers with `UserEvent`s which the event loop forwards to the
//! page as calls of `window.*` functions.

pub mod commands;
pub mod events;
pub mod file_dialog;
pub mod filtering;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use std::sync::{Arc, Mutex};

use events::{IpcMessage, UserEvent};
use file_dialog::DialogService;
use proxy::EventProxy;
use serde::Serialize;
use state::AppState;

/// Parses one IPC message and runs the matching command handler.
pub fn handle_ipc_message<P: EventProxy, D: DialogService + ?Sized>(
    message: String,
    dialog: Arc<D>,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let msg: IpcMessage = match serde_json::from_str(&message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::error!("Failed to parse IPC message: {} ({})", message, e);
            return;
        }
    };
    tracing::debug!(command = %msg.command, "IPC message received");

    let payload = msg.payload;
    match msg.command.as_str() {
        "initialize" => commands::initialize(proxy, state),
        "selectFolders" => commands::select_folders(dialog.as_ref(), proxy, state),
        "addRoots" => commands::add_roots(payload, proxy, state),
        "removeRoot" => commands::remove_root(payload, proxy, state),
        "refresh" => commands::refresh(proxy, state),
        "updateFilters" => commands::update_filters(payload, proxy, state),
        "cancelSearch" => commands::cancel_search(proxy, state),
        "resetTimeFilter" => commands::reset_time_filter(proxy, state),
        "selectSpreadsheet" => commands::select_spreadsheet(dialog.as_ref(), proxy, state),
        "selectCategory" => commands::select_category(payload, proxy, state),
        "openSpreadsheetLocation" => commands::open_spreadsheet_location(proxy, state),
        "setTreeItemChecked" => commands::set_tree_item_checked(payload, proxy, state),
        "setResultChecked" => commands::set_result_checked(payload, proxy, state),
        "selectAllTree" => commands::set_all_tree(true, proxy, state),
        "deselectAllTree" => commands::set_all_tree(false, proxy, state),
        "selectAllResults" => commands::set_all_results(true, proxy, state),
        "deselectAllResults" => commands::set_all_results(false, proxy, state),
        "toggleExpansion" => commands::toggle_expansion(payload, proxy, state),
        "expandCollapseAll" => commands::expand_collapse_all(payload, proxy, state),
        "previewFile" => commands::preview_file(payload, proxy, state),
        "clearPreview" => commands::clear_preview(proxy, state),
        "openPath" => commands::open_path(payload, proxy),
        "revealPath" => commands::reveal_path(payload, proxy),
        "createFolder" => commands::create_folder(payload, proxy, state),
        "renamePath" => commands::rename_path(payload, proxy, state),
        "deletePath" => commands::delete_path(payload, proxy, state),
        "exportSelected" => commands::export_selected(dialog.as_ref(), proxy, state),
        "cancelExport" => commands::cancel_export(proxy, state),
        "updateConfig" => commands::update_config(payload, proxy, state),
        other => tracing::warn!("Unknown IPC command: {}", other),
    }
}

/// Forwards a backend event to the page.
pub fn handle_user_event(event: UserEvent, webview: &wry::WebView) {
    let script = match event {
        UserEvent::StateUpdate(ui_state) => js_call("render", &ui_state),
        UserEvent::SearchProgress(progress) => js_call("showSearchProgress", &progress),
        UserEvent::ExportProgress(progress) => js_call("showExportProgress", &progress),
        UserEvent::ShowPreview(preview) => js_call("showPreview", &preview),
        UserEvent::ShowError(message) => js_call("showError", &message),
        UserEvent::ExportComplete { success, message } => js_call(
            "showExportResult",
            &serde_json::json!({ "success": success, "message": message }),
        ),
        UserEvent::DragStateChanged(active) => js_call("setDragState", &active),
    };

    if let Some(script) = script {
        if let Err(e) = webview.evaluate_script(&script) {
            tracing::error!("Failed to evaluate script: {}", e);
        }
    }
}

fn js_call<T: Serialize + ?Sized>(function: &str, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(format!("window.{function} && window.{function}({json});")),
        Err(e) => {
            tracing::error!(function, "Failed to serialize event payload: {}", e);
            None
        }
    }
}

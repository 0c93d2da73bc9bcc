//! Defines the event and message structures for communication between the backend and frontend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::view_model::UiState;
use crate::core::ExportProgress;

/// Progress of the running (or last) search, sent outside of full state updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProgressView {
    pub search_id: u64,
    pub processed: usize,
    pub total: usize,
    pub matched: usize,
    pub running: bool,
}

/// What the preview pane should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PreviewPayload {
    /// A PDF as `data:application/pdf;base64,...`.
    Pdf { path: PathBuf, data_url: String },
    Unsupported { path: PathBuf, reason: String },
    Empty,
}

/// Events sent from the Rust backend to the WebView (UI thread).
///
/// Each variant corresponds to a specific JavaScript function (`window.*`) that will be called in the frontend.
#[derive(Debug)]
pub enum UserEvent {
    /// A complete state update to re-render the UI.
    StateUpdate(Box<UiState>),
    SearchProgress(SearchProgressView),
    ExportProgress(ExportProgress),
    ShowPreview(PreviewPayload),
    /// An error message to be displayed to the user.
    ShowError(String),
    /// Export finished (or was cancelled); carries the summary text.
    ExportComplete { success: bool, message: String },
    /// Indicates that a file is being dragged over the window.
    DragStateChanged(bool),
}

/// A message received from the WebView via the IPC channel.
#[derive(Deserialize, Debug)]
pub struct IpcMessage {
    /// The name of the command to execute.
    pub command: String,
    /// The payload associated with the command, as a JSON value.
    #[serde(default)]
    pub payload: serde_json::Value,
}

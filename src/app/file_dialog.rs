//! An abstraction layer for native file dialogs to enable testing.

use std::path::{Path, PathBuf};

/// Defines a common interface for file and folder selection dialogs.
/// This allows for a mock implementation during tests, avoiding the need
/// to interact with actual OS dialog windows.
pub trait DialogService: Send + Sync {
    /// Opens a dialog to select one or more root folders.
    fn pick_directories(&self) -> Vec<PathBuf>;

    /// Opens a dialog to select the metadata spreadsheet.
    fn pick_spreadsheet(&self) -> Option<PathBuf>;

    /// Opens a dialog to select the export destination, starting at `start`.
    fn pick_export_directory(&self, start: Option<&Path>) -> Option<PathBuf>;
}

/// The production implementation that uses the `rfd` crate to show native OS dialogs.
pub struct NativeDialogService;

impl DialogService for NativeDialogService {
    fn pick_directories(&self) -> Vec<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select folders to search")
            .pick_folders()
            .unwrap_or_default()
    }

    fn pick_spreadsheet(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select metadata spreadsheet")
            .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods", "csv"])
            .pick_file()
    }

    fn pick_export_directory(&self, start: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title("Export selected files to");
        if let Some(dir) = start {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_folder()
    }
}

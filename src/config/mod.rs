pub mod settings;

use crate::core::ConflictPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub last_roots: Vec<PathBuf>,
    pub auto_load_last_roots: bool,
    pub last_spreadsheet: Option<PathBuf>,
    pub export_directory: Option<PathBuf>,
    pub conflict_policy: ConflictPolicy,
    pub show_hidden_in_tree: bool,
    /// Gitignore-style patterns applied to both the tree and the search.
    pub exclude_patterns: Vec<String>,
    pub search_debounce_ms: u64,
    pub result_batch_size: usize,
    pub progress_interval: usize,
    pub default_time_window_days: u64,
    pub max_preview_mb: u64,
    pub window_size: (f64, f64),
    pub window_position: (f64, f64),
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let exclude_patterns = [".DS_Store", "Thumbs.db", "desktop.ini", "~$*"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            last_roots: Vec::new(),
            auto_load_last_roots: true,
            last_spreadsheet: None,
            export_directory: dirs::desktop_dir(),
            conflict_policy: ConflictPolicy::Skip,
            show_hidden_in_tree: false,
            exclude_patterns,
            search_debounce_ms: 300,
            result_batch_size: 50,
            progress_interval: 100,
            default_time_window_days: 7,
            max_preview_mb: 50,
            window_size: (1400.0, 900.0),
            window_position: (100.0, 100.0),
        }
    }
}

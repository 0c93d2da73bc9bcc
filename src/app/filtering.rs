//! Turns the raw filter inputs of the UI into a core `SearchFilter`, and holds
//! the path helpers the result list and the tree share.

use crate::core::{AttributeFilter, SearchFilter, TimeRange};
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The filter panel exactly as the user filled it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterInput {
    pub keyword: String,
    pub category_enabled: bool,
    pub category: String,
    pub model_enabled: bool,
    pub model: String,
    pub apn_enabled: bool,
    pub apn: String,
    pub custom_enabled: bool,
    pub custom: String,
    pub time_enabled: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterInput {
    /// Inputs with the date pickers preset to the last `days` days.
    pub fn with_default_window(days: u64) -> Self {
        let mut input = Self::default();
        input.reset_time_window(days);
        input
    }

    pub fn reset_time_window(&mut self, days: u64) {
        let today = Local::now().date_naive();
        self.start_date = Some(today.checked_sub_days(Days::new(days)).unwrap_or(today));
        self.end_date = Some(today);
    }

    pub fn to_search_filter(&self) -> SearchFilter {
        let time = match (self.time_enabled, self.start_date, self.end_date) {
            (true, Some(start), Some(end)) => Some(TimeRange::from_dates(start, end)),
            (true, Some(day), None) | (true, None, Some(day)) => Some(TimeRange::from_dates(day, day)),
            _ => None,
        };
        SearchFilter {
            keyword: self.keyword.clone(),
            category: AttributeFilter::new(self.category_enabled, self.category.clone()),
            model: AttributeFilter::new(self.model_enabled, self.model.clone()),
            apn: AttributeFilter::new(self.apn_enabled, self.apn.clone()),
            custom: AttributeFilter::new(self.custom_enabled, self.custom.clone()),
            time,
        }
    }
}

/// `basename(root)/relative/path` for the first root containing `path`.
///
/// Paths outside every root are shown in full.
pub fn display_path(path: &Path, roots: &[PathBuf]) -> String {
    for root in roots {
        if let Ok(relative) = path.strip_prefix(root) {
            let root_name = root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| root.to_string_lossy().to_string());
            if relative.as_os_str().is_empty() {
                return root_name;
            }
            let relative = relative.to_string_lossy().replace('\\', "/");
            return format!("{root_name}/{relative}");
        }
    }
    path.to_string_lossy().to_string()
}

/// All ancestors of `path` up to and including its root.
pub fn ancestors_within_roots(path: &Path, roots: &[PathBuf]) -> Vec<PathBuf> {
    let Some(root) = roots.iter().find(|r| path.starts_with(r)) else {
        return Vec::new();
    };
    let mut parents = Vec::new();
    let mut current = path.parent();
    while let Some(parent) = current {
        if !parent.starts_with(root) {
            break;
        }
        parents.push(parent.to_path_buf());
        current = parent.parent();
    }
    parents
}

//! The composite filter predicate evaluated by the search worker for every file.

use super::FileEntry;
use chrono::{Days, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// One optional "file name contains" condition, e.g. the selected spreadsheet category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub enabled: bool,
    pub value: String,
}

impl AttributeFilter {
    pub fn new(enabled: bool, value: impl Into<String>) -> Self {
        Self {
            enabled,
            value: value.into(),
        }
    }

    /// `true` if this condition can exclude anything.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.value.is_empty()
    }

    fn normalized(&self) -> Self {
        Self {
            enabled: self.enabled,
            value: self.value.trim().to_lowercase(),
        }
    }
}

/// An inclusive modification-time window in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// From the start of `start` to the last second of `end`, in local time.
    ///
    /// A reversed pair of dates is swapped rather than producing an empty window.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let (first, last) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start: local_timestamp(first.and_hms_opt(0, 0, 0)),
            end: local_timestamp(last.and_hms_opt(23, 59, 59)),
        }
    }

    /// The window covering the last `days` days up to and including today.
    pub fn last_days(days: u64) -> Self {
        let today = Local::now().date_naive();
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(today);
        Self::from_dates(start, today)
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

fn local_timestamp(naive: Option<NaiveDateTime>) -> i64 {
    let Some(naive) = naive else { return 0 };
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp(),
        // Falls into a DST gap; fall back to treating it as UTC.
        None => naive.and_utc().timestamp(),
    }
}

/// All search conditions, combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub keyword: String,
    pub category: AttributeFilter,
    pub model: AttributeFilter,
    pub apn: AttributeFilter,
    pub custom: AttributeFilter,
    pub time: Option<TimeRange>,
}

impl SearchFilter {
    /// Trims and lowercases every text condition so matching is case-insensitive.
    pub fn normalized(&self) -> Self {
        Self {
            keyword: self.keyword.trim().to_lowercase(),
            category: self.category.normalized(),
            model: self.model.normalized(),
            apn: self.apn.normalized(),
            custom: self.custom.normalized(),
            time: self.time,
        }
    }

    /// `true` if at least one condition would restrict the result set.
    ///
    /// Without any condition no search is started at all.
    pub fn has_any_condition(&self) -> bool {
        !self.keyword.trim().is_empty()
            || self.attributes().iter().any(|a| a.enabled && !a.value.trim().is_empty())
            || self.time.is_some()
    }

    /// Evaluates the filter against one entry. Expects a `normalized()` filter.
    pub fn matches(&self, entry: &FileEntry) -> bool {
        let name_lower = entry.name.to_lowercase();

        if !self.keyword.is_empty() && !name_lower.contains(&self.keyword) {
            return false;
        }

        if self
            .attributes()
            .iter()
            .any(|a| a.is_active() && !name_lower.contains(&a.value))
        {
            return false;
        }

        match self.time {
            Some(range) => range.contains(entry.modified.unwrap_or(0)),
            None => true,
        }
    }

    fn attributes(&self) -> [&AttributeFilter; 4] {
        [&self.category, &self.model, &self.apn, &self.custom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(name: &str, modified: Option<i64>) -> FileEntry {
        FileEntry {
            path: PathBuf::from("/docs").join(name),
            name: name.to_string(),
            is_directory: false,
            modified,
            size: 10,
        }
    }

    #[test]
    fn test_empty_filter_has_no_condition() {
        let filter = SearchFilter::default();
        assert!(!filter.has_any_condition());

        let whitespace = SearchFilter {
            keyword: "   ".to_string(),
            ..Default::default()
        };
        assert!(!whitespace.has_any_condition());
    }

    #[test]
    fn test_enabled_attribute_without_value_is_not_a_condition() {
        let filter = SearchFilter {
            category: AttributeFilter::new(true, ""),
            model: AttributeFilter::new(false, "X100"),
            ..Default::default()
        };
        assert!(!filter.has_any_condition());
        assert!(filter.normalized().matches(&entry("anything.pdf", None)));
    }

    #[test]
    fn test_keyword_matching_is_case_insensitive() {
        let filter = SearchFilter {
            keyword: " Report ".to_string(),
            ..Default::default()
        }
        .normalized();

        assert!(filter.matches(&entry("Annual_REPORT_2024.pdf", None)));
        assert!(!filter.matches(&entry("invoice.pdf", None)));
    }

    #[test]
    fn test_all_conditions_are_combined_with_and() {
        let filter = SearchFilter {
            keyword: "spec".to_string(),
            category: AttributeFilter::new(true, "Battery"),
            apn: AttributeFilter::new(true, "630-1234"),
            ..Default::default()
        }
        .normalized();

        assert!(filter.matches(&entry("battery_spec_630-1234.pdf", None)));
        assert!(!filter.matches(&entry("battery_spec.pdf", None)));
        assert!(!filter.matches(&entry("display_spec_630-1234.pdf", None)));
    }

    #[test]
    fn test_disabled_attribute_is_ignored() {
        let filter = SearchFilter {
            keyword: "spec".to_string(),
            custom: AttributeFilter::new(false, "never-present"),
            ..Default::default()
        }
        .normalized();

        assert!(filter.matches(&entry("spec.pdf", None)));
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let range = TimeRange { start: 100, end: 200 };
        let filter = SearchFilter {
            time: Some(range),
            ..Default::default()
        };
        assert!(filter.has_any_condition());

        assert!(filter.matches(&entry("a.pdf", Some(100))));
        assert!(filter.matches(&entry("a.pdf", Some(200))));
        assert!(!filter.matches(&entry("a.pdf", Some(201))));
        assert!(!filter.matches(&entry("a.pdf", None)));
    }

    #[test]
    fn test_time_range_from_dates_covers_whole_days() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let range = TimeRange::from_dates(day, day);
        assert_eq!(range.end - range.start, 24 * 3600 - 1);
    }

    #[test]
    fn test_time_range_from_reversed_dates_is_swapped() {
        let early = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            TimeRange::from_dates(late, early),
            TimeRange::from_dates(early, late)
        );
    }

    #[test]
    fn test_last_days_contains_now() {
        let range = TimeRange::last_days(7);
        let now = Local::now().timestamp();
        assert!(range.contains(now));
        assert!(!range.contains(now - 9 * 24 * 3600));
    }
}

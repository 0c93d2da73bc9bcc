//! Material metadata loaded from a spreadsheet.
//!
//! The sheet provides the options of the category, model and APN filter
//! combos: models and APNs are offered per category.

use super::{CoreError, CoreResult};
use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CATEGORY_COLUMN: &str = "Material Category";
/// Misspelled header found in older sheets.
const LEGACY_CATEGORY_COLUMN: &str = "Material Categroy";
pub const MODEL_COLUMN: &str = "Material Model";
pub const APN_COLUMN: &str = "APN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataTable {
    pub source: PathBuf,
    /// Unique categories in order of first appearance.
    pub categories: Vec<String>,
    /// `models[i]` belongs to `categories[i]`.
    pub models: Vec<Vec<String>>,
    /// `apns[i]` belongs to `categories[i]`.
    pub apns: Vec<Vec<String>>,
}

impl MetadataTable {
    /// Reads the first worksheet of an Excel/ODS workbook or a CSV file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        let rows = if is_csv {
            read_csv_rows(path)?
        } else {
            read_workbook_rows(path)?
        };

        let table = Self::from_rows(path, rows)?;
        tracing::info!(
            path = %path.display(),
            categories = table.categories.len(),
            "✅ Metadata spreadsheet loaded"
        );
        Ok(table)
    }

    /// Builds the table from raw rows; the first row is the header.
    pub fn from_rows(source: &Path, rows: Vec<Vec<String>>) -> CoreResult<Self> {
        let mut rows = rows.into_iter();
        let header = rows.next().unwrap_or_default();

        let find = |names: &[&str]| {
            header.iter().position(|h| {
                let h = h.trim();
                names.iter().any(|n| h.eq_ignore_ascii_case(n))
            })
        };
        let category_col = find(&[CATEGORY_COLUMN, LEGACY_CATEGORY_COLUMN]);
        let model_col = find(&[MODEL_COLUMN]);
        let apn_col = find(&[APN_COLUMN]);

        let (Some(category_col), Some(model_col), Some(apn_col)) = (category_col, model_col, apn_col)
        else {
            let missing = [
                (category_col, CATEGORY_COLUMN),
                (model_col, MODEL_COLUMN),
                (apn_col, APN_COLUMN),
            ]
            .into_iter()
            .filter(|(col, _)| col.is_none())
            .map(|(_, name)| name.to_string())
            .collect();
            return Err(CoreError::MissingColumns(missing));
        };

        let mut table = Self {
            source: source.to_path_buf(),
            ..Default::default()
        };
        // Last non-empty value per column, used to fill merged/blank cells.
        let mut last = [String::new(), String::new(), String::new()];

        for row in rows {
            let cell = |i: usize| row.get(i).map(|c| c.trim()).unwrap_or_default();
            let values = [cell(category_col), cell(model_col), cell(apn_col)];
            if values.iter().all(|v| v.is_empty()) {
                continue;
            }
            for (slot, value) in last.iter_mut().zip(values) {
                if !value.is_empty() {
                    *slot = value.to_string();
                }
            }
            let [category, model, apn] = &last;
            if category.is_empty() {
                continue;
            }
            let i = match table.categories.iter().position(|c| c == category) {
                Some(i) => i,
                None => {
                    table.categories.push(category.clone());
                    table.models.push(Vec::new());
                    table.apns.push(Vec::new());
                    table.categories.len() - 1
                }
            };
            push_unique(&mut table.models[i], model);
            push_unique(&mut table.apns[i], apn);
        }

        Ok(table)
    }

    /// Models and APNs for the category at `index`; empty when out of range.
    pub fn options_for(&self, index: usize) -> (&[String], &[String]) {
        (
            self.models.get(index).map(Vec::as_slice).unwrap_or(&[]),
            self.apns.get(index).map(Vec::as_slice).unwrap_or(&[]),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

fn read_workbook_rows(path: &Path) -> CoreResult<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| spreadsheet_error(path, "workbook has no worksheets"))?
        .map_err(|e| spreadsheet_error(path, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn spreadsheet_error(path: &Path, e: impl std::fmt::Display) -> CoreError {
    CoreError::Spreadsheet(e.to_string(), path.to_path_buf())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn read_csv_rows(path: &Path) -> CoreResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.trim_start_matches('\u{feff}').to_string()).collect());
    }
    Ok(rows)
}

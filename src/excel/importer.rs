//! Excel importer implementation - Excel (.xlsx) → tables

use crate::error::{TabulaError, TabulaResult};
use crate::store::memory::Sheet;
use crate::store::MemoryStore;
use crate::types::{CellValue, Origin};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Excel importer for loading .xlsx files into a [`MemoryStore`]
pub struct ExcelImporter {
    path: PathBuf,
}

impl ExcelImporter {
    /// Create a new Excel importer
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Import every worksheet as a table named after the sheet
    pub fn import(&self) -> TabulaResult<MemoryStore> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| {
            TabulaError::Import(format!(
                "Failed to open Excel file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut store = MemoryStore::new();
        let sheet_names = workbook.sheet_names().to_vec();

        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                TabulaError::Import(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;
            // Formulas are optional; a sheet without them still imports
            let formulas = workbook.worksheet_formula(&sheet_name).ok();

            let sheet = store.add_table(sheet_name.clone());
            load_values(sheet, &range);
            if let Some(ref formulas) = formulas {
                load_formulas(sheet, formulas);
            }
            debug!(sheet = %sheet_name, cells = range.used_cells().count(), "imported sheet");
        }

        Ok(store)
    }
}

fn absolute(start: Option<(u32, u32)>, row: usize, col: usize) -> Origin {
    let (row0, col0) = start.unwrap_or((0, 0));
    Origin::new(row0 as usize + row + 1, col0 as usize + col + 1)
}

fn load_values(sheet: &mut Sheet, range: &Range<Data>) {
    let start = range.start();
    for (row, col, data) in range.used_cells() {
        let value = convert_data(data);
        if !value.is_blank() {
            sheet.set_value(absolute(start, row, col), value);
        }
    }
}

fn load_formulas(sheet: &mut Sheet, formulas: &Range<String>) {
    let start = formulas.start();
    for (row, col, formula) in formulas.used_cells() {
        if !formula.is_empty() {
            // calamine strips the leading '='; set_formula restores it
            sheet.set_formula(absolute(start, row, col), formula);
        }
    }
}

/// Convert a calamine cell to a [`CellValue`]
pub(crate) fn convert_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    let raw = s.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_scalars() {
        assert_eq!(convert_data(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(convert_data(&Data::Bool(false)), CellValue::Boolean(false));
        assert_eq!(
            convert_data(&Data::String("x".to_string())),
            CellValue::from("x")
        );
        assert_eq!(convert_data(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_convert_iso_dates() {
        let v = convert_data(&Data::DateTimeIso("2024-05-06".to_string()));
        assert_eq!(v.as_text(), "2024-05-06");
        let v = convert_data(&Data::DateTimeIso("not a date".to_string()));
        assert_eq!(v, CellValue::from("not a date"));
    }

    #[test]
    fn test_absolute_offsets_by_range_start() {
        assert_eq!(absolute(Some((2, 1)), 0, 0), Origin::new(3, 2));
        assert_eq!(absolute(None, 1, 1), Origin::new(2, 2));
    }

    #[test]
    fn test_missing_file_is_import_error() {
        let err = ExcelImporter::new("/nonexistent/book.xlsx")
            .import()
            .unwrap_err();
        assert!(matches!(err, TabulaError::Import(_)));
    }
}

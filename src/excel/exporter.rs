//! Excel exporter implementation - tables → Excel (.xlsx)

use crate::error::{TabulaError, TabulaResult};
use crate::store::memory::{Cell, Sheet};
use crate::store::MemoryStore;
use crate::types::{CellValue, Origin};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet};
use std::path::Path;

/// Excel exporter writing every table of a store as a worksheet
pub struct ExcelExporter<'a> {
    store: &'a MemoryStore,
    date_format: Format,
}

impl<'a> ExcelExporter<'a> {
    /// Create a new Excel exporter
    pub fn new(store: &'a MemoryStore) -> Self {
        Self {
            store,
            date_format: Format::new().set_num_format("yyyy-mm-dd"),
        }
    }

    /// Export the store to an Excel .xlsx file
    pub fn export(&self, output_path: &Path) -> TabulaResult<()> {
        let mut workbook = Workbook::new();

        for (table_name, sheet) in self.store.tables() {
            self.export_table(&mut workbook, table_name, sheet)?;
        }

        workbook
            .save(output_path)
            .map_err(|e| TabulaError::Export(format!("Failed to save Excel file: {}", e)))?;

        Ok(())
    }

    /// Export a single table to a worksheet
    fn export_table(
        &self,
        workbook: &mut Workbook,
        table_name: &str,
        sheet: &Sheet,
    ) -> TabulaResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(table_name)
            .map_err(|e| TabulaError::Export(format!("Failed to set worksheet name: {}", e)))?;

        for (origin, cell) in sheet.cells() {
            self.write_cell(worksheet, *origin, cell)?;
        }
        Ok(())
    }

    fn write_cell(&self, worksheet: &mut Worksheet, origin: Origin, cell: &Cell) -> TabulaResult<()> {
        // Worksheet API is 0-indexed
        let row = u32::try_from(origin.row - 1)
            .map_err(|_| TabulaError::Export(format!("Row out of range at {}", origin)))?;
        let col = u16::try_from(origin.col - 1)
            .map_err(|_| TabulaError::Export(format!("Column out of range at {}", origin)))?;
        let err = |e: rust_xlsxwriter::XlsxError| {
            TabulaError::Export(format!("Failed to write cell {}: {}", origin, e))
        };

        if let Some(ref formula) = cell.formula {
            let mut formula = Formula::new(formula);
            if !cell.value.is_blank() {
                formula = formula.set_result(cell.value.as_text());
            }
            worksheet.write_formula(row, col, formula).map_err(err)?;
            return Ok(());
        }

        match &cell.value {
            CellValue::Empty => {}
            CellValue::Text(s) if s.is_empty() => {}
            CellValue::Text(s) => {
                worksheet.write_string(row, col, s).map_err(err)?;
            }
            CellValue::Number(n) => {
                worksheet.write_number(row, col, *n).map_err(err)?;
            }
            CellValue::Boolean(b) => {
                worksheet.write_boolean(row, col, *b).map_err(err)?;
            }
            CellValue::Date(dt) => {
                let custom = cell
                    .number_format
                    .as_deref()
                    .and_then(excel_date_format)
                    .map(|code| Format::new().set_num_format(code));
                let format = custom.as_ref().unwrap_or(&self.date_format);
                worksheet
                    .write_datetime_with_format(row, col, dt, format)
                    .map_err(err)?;
            }
        }
        Ok(())
    }
}

/// Translate a strftime date pattern into an Excel number format code.
///
/// Returns `None` for directives Excel has no equivalent for.
pub(crate) fn excel_date_format(pattern: &str) -> Option<String> {
    let mut code = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            if c.is_ascii_alphabetic() {
                code.push('\\');
            }
            code.push(c);
            continue;
        }
        let mut directive = chars.next()?;
        let unpadded = directive == '-';
        if unpadded {
            directive = chars.next()?;
        }
        let token = match (directive, unpadded) {
            ('Y', false) => "yyyy",
            ('y', false) => "yy",
            ('m', false) => "mm",
            ('m', true) => "m",
            ('d', false) => "dd",
            ('d', true) | ('e', false) => "d",
            ('b', false) => "mmm",
            ('B', false) => "mmmm",
            ('a', false) => "ddd",
            ('A', false) => "dddd",
            ('H', false) => "hh",
            ('H', true) => "h",
            ('M', false) => "mm",
            ('S', false) => "ss",
            ('%', false) => "%",
            _ => return None,
        };
        code.push_str(token);
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_date_format() {
        assert_eq!(excel_date_format("%d/%m/%Y").as_deref(), Some("dd/mm/yyyy"));
        assert_eq!(excel_date_format("%b %-d, %Y").as_deref(), Some("mmm d, yyyy"));
        assert_eq!(
            excel_date_format("%Y-%m-%d %H:%M:%S").as_deref(),
            Some("yyyy-mm-dd hh:mm:ss")
        );
        assert_eq!(excel_date_format("Day %d").as_deref(), Some("\\D\\a\\y dd"));
    }

    #[test]
    fn test_unsupported_directive_falls_back() {
        assert_eq!(excel_date_format("%s"), None);
        assert_eq!(excel_date_format("%Y-%"), None);
    }
}

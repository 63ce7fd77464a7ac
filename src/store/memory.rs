//! In-memory document of named tables

use super::TableStore;
use crate::error::{TabulaError, TabulaResult};
use crate::types::{format_date, CellValue, CellVariant, Matrix, Origin, Shape};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// One cell: value, optional formula and presentation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// Literal value, or the cached result when a formula is set
    pub value: CellValue,
    /// Formula text including the leading `=`
    pub formula: Option<String>,
    /// Host-rendered text overriding the default rendering
    pub display: Option<String>,
    /// strftime pattern used to render dates; survives clears
    pub number_format: Option<String>,
}

impl Cell {
    pub fn is_populated(&self) -> bool {
        !self.value.is_blank() || self.formula.is_some()
    }

    pub fn display_text(&self) -> String {
        if let Some(ref text) = self.display {
            return text.clone();
        }
        match &self.value {
            CellValue::Date(dt) => format_date(dt, self.number_format.as_deref()),
            other => other.as_text(),
        }
    }

    fn is_default(&self) -> bool {
        *self == Cell::default()
    }

    fn blank_contents(&mut self) {
        self.value = CellValue::Empty;
        self.formula = None;
        self.display = None;
    }
}

/// Sparse sheet keyed by 1-based coordinate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    cells: BTreeMap<Origin, Cell>,
}

impl Sheet {
    pub fn get(&self, cell: Origin) -> Option<&Cell> {
        self.cells.get(&cell)
    }

    pub fn value(&self, cell: Origin) -> CellValue {
        self.get(cell).map(|c| c.value.clone()).unwrap_or_default()
    }

    pub fn formula(&self, cell: Origin) -> Option<&str> {
        self.get(cell).and_then(|c| c.formula.as_deref())
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (&Origin, &Cell)> {
        self.cells.iter()
    }

    pub fn set_value(&mut self, cell: Origin, value: CellValue) {
        let entry = self.cells.entry(cell).or_default();
        entry.value = value;
        entry.formula = None;
        entry.display = None;
        self.prune(cell);
    }

    /// Set a formula, keeping the current value as its cached result
    pub fn set_formula(&mut self, cell: Origin, formula: &str) {
        let entry = self.cells.entry(cell).or_default();
        entry.formula = normalize_formula(formula);
        self.prune(cell);
    }

    pub fn set_display(&mut self, cell: Origin, display: impl Into<String>) {
        self.cells.entry(cell).or_default().display = Some(display.into());
    }

    pub fn set_number_format(&mut self, cell: Origin, pattern: impl Into<String>) {
        self.cells.entry(cell).or_default().number_format = Some(pattern.into());
    }

    pub fn clear(&mut self, cell: Origin) {
        if let Some(entry) = self.cells.get_mut(&cell) {
            entry.blank_contents();
        }
        self.prune(cell);
    }

    /// Highest populated row, if any
    pub fn max_row(&self) -> Option<usize> {
        self.populated().map(|o| o.row).max()
    }

    /// Highest populated column at or after `from_column`, if any
    pub fn max_col(&self, from_column: usize) -> Option<usize> {
        self.populated()
            .map(|o| o.col)
            .filter(|c| *c >= from_column)
            .max()
    }

    fn populated(&self) -> impl Iterator<Item = &Origin> {
        self.cells
            .iter()
            .filter(|(_, c)| c.is_populated())
            .map(|(o, _)| o)
    }

    fn prune(&mut self, cell: Origin) {
        if self.cells.get(&cell).is_some_and(Cell::is_default) {
            self.cells.remove(&cell);
        }
    }

    fn read(&self, cell: Origin, variant: CellVariant) -> CellValue {
        let Some(c) = self.get(cell) else {
            return CellValue::Empty;
        };
        match variant {
            CellVariant::Value => c.value.clone(),
            CellVariant::DisplayText => match c.display_text() {
                text if text.is_empty() => CellValue::Empty,
                text => CellValue::Text(text),
            },
            CellVariant::FormulaText => c
                .formula
                .clone()
                .map(CellValue::Text)
                .unwrap_or_default(),
        }
    }
}

fn normalize_formula(formula: &str) -> Option<String> {
    let trimmed = formula.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.starts_with('=') {
        Some(trimmed.to_string())
    } else {
        Some(format!("={}", trimmed))
    }
}

/// Document holding named tables in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    tables: IndexMap<String, Sheet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an empty table
    pub fn add_table(&mut self, name: impl Into<String>) -> &mut Sheet {
        let name = name.into();
        self.tables.insert(name.clone(), Sheet::default());
        &mut self.tables[&name]
    }

    /// Add a table filled from `rows`, starting at A1
    pub fn with_rows(mut self, name: impl Into<String>, rows: Matrix) -> Self {
        let sheet = self.add_table(name);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                if !value.is_blank() {
                    sheet.set_value(Origin::new(r + 1, c + 1), value);
                }
            }
        }
        self
    }

    pub fn table(&self, name: &str) -> TabulaResult<&Sheet> {
        self.tables
            .get(name)
            .ok_or_else(|| TabulaError::table_not_found(name))
    }

    pub fn table_mut(&mut self, name: &str) -> TabulaResult<&mut Sheet> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| TabulaError::table_not_found(name))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &String> {
        self.tables.keys()
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &Sheet)> {
        self.tables.iter()
    }

    /// Dump the used range `A1:<last row><last column>` as values
    pub fn rows(&self, name: &str) -> TabulaResult<Matrix> {
        let rows = self.last_populated_row(name)?;
        let cols = self.last_populated_column(name, 1)?;
        self.read_block(
            name,
            Origin::new(1, 1),
            Shape::new(rows, cols),
            CellVariant::Value,
        )
    }
}

impl TableStore for MemoryStore {
    fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    fn read_block(
        &self,
        table: &str,
        origin: Origin,
        shape: Shape,
        variant: CellVariant,
    ) -> TabulaResult<Matrix> {
        let sheet = self.table(table)?;
        Ok((0..shape.rows)
            .map(|r| {
                (0..shape.cols)
                    .map(|c| sheet.read(Origin::new(origin.row + r, origin.col + c), variant))
                    .collect()
            })
            .collect())
    }

    fn write_block(&mut self, table: &str, origin: Origin, values: &Matrix) -> TabulaResult<()> {
        let sheet = self.table_mut(table)?;
        for (r, row) in values.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.set_value(Origin::new(origin.row + r, origin.col + c), value.clone());
            }
        }
        Ok(())
    }

    fn write_formula(&mut self, table: &str, cell: Origin, formula: &str) -> TabulaResult<()> {
        self.table_mut(table)?.set_formula(cell, formula);
        Ok(())
    }

    fn last_populated_row(&self, table: &str) -> TabulaResult<usize> {
        Ok(self.table(table)?.max_row().unwrap_or(1))
    }

    fn last_populated_column(&self, table: &str, from_column: usize) -> TabulaResult<usize> {
        Ok(self
            .table(table)?
            .max_col(from_column)
            .unwrap_or(from_column))
    }

    fn clear_region(&mut self, table: &str, origin: Origin, shape: Shape) -> TabulaResult<()> {
        let sheet = self.table_mut(table)?;
        for r in 0..shape.rows {
            for c in 0..shape.cols {
                sheet.clear(Origin::new(origin.row + r, origin.col + c));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn people() -> MemoryStore {
        MemoryStore::new().with_rows(
            "People",
            vec![
                vec!["Name".into(), "Age".into()],
                vec!["Alice".into(), 30.into()],
                vec!["Bob".into(), 25.into()],
            ],
        )
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let store = MemoryStore::new();
        let err = store.last_populated_row("Nope").unwrap_err();
        assert!(matches!(err, TabulaError::NotFound(_)));
        assert!(!store.has_table("Nope"));
    }

    #[test]
    fn test_read_block_pads_outside_populated_area() {
        let store = people();
        let block = store
            .read_block("People", Origin::new(2, 1), Shape::new(3, 3), CellVariant::Value)
            .unwrap();
        assert_eq!(block.len(), 3);
        assert!(block.iter().all(|row| row.len() == 3));
        assert_eq!(block[0][0], CellValue::from("Alice"));
        assert_eq!(block[2][2], CellValue::Empty);
    }

    #[test]
    fn test_last_populated_defaults() {
        let mut store = MemoryStore::new();
        store.add_table("Empty");
        assert_eq!(store.last_populated_row("Empty").unwrap(), 1);
        assert_eq!(store.last_populated_column("Empty", 4).unwrap(), 4);

        let store = people();
        assert_eq!(store.last_populated_row("People").unwrap(), 3);
        assert_eq!(store.last_populated_column("People", 1).unwrap(), 2);
        assert_eq!(store.last_populated_column("People", 3).unwrap(), 3);
    }

    #[test]
    fn test_write_value_drops_formula() {
        let mut store = people();
        store
            .write_formula("People", Origin::new(4, 2), "SUM(B2:B3)")
            .unwrap();
        assert_eq!(
            store.table("People").unwrap().formula(Origin::new(4, 2)),
            Some("=SUM(B2:B3)")
        );
        assert_eq!(store.last_populated_row("People").unwrap(), 4);

        store
            .write_block("People", Origin::new(4, 2), &vec![vec![55.into()]])
            .unwrap();
        assert_eq!(store.table("People").unwrap().formula(Origin::new(4, 2)), None);
    }

    #[test]
    fn test_clear_region_keeps_number_format() {
        let mut store = people();
        let cell = Origin::new(2, 2);
        store.table_mut("People").unwrap().set_number_format(cell, "%d/%m/%Y");
        store
            .clear_region("People", Origin::new(2, 1), Shape::new(2, 2))
            .unwrap();
        let sheet = store.table("People").unwrap();
        assert_eq!(sheet.value(cell), CellValue::Empty);
        assert_eq!(
            sheet.get(cell).and_then(|c| c.number_format.as_deref()),
            Some("%d/%m/%Y")
        );
        assert_eq!(store.last_populated_row("People").unwrap(), 1);
    }

    #[test]
    fn test_display_text_uses_number_format() {
        let mut store = MemoryStore::new();
        let sheet = store.add_table("Dates");
        let cell = Origin::new(1, 1);
        sheet.set_value(cell, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().into());
        sheet.set_number_format(cell, "%d/%m/%Y");
        let block = store
            .read_block("Dates", cell, Shape::new(1, 1), CellVariant::DisplayText)
            .unwrap();
        assert_eq!(block[0][0], CellValue::from("09/03/2024"));
    }

    #[test]
    fn test_rows_dump() {
        let store = people();
        let rows = store.rows("People").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec![CellValue::from("Bob"), CellValue::from(25)]);
    }
}

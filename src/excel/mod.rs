//! Excel workbook adapter
//!
//! Loads every sheet of an `.xlsx` into a [`MemoryStore`](crate::store::MemoryStore)
//! and saves one back, so the transcoding core can work on real files:
//! - Import: Excel (.xlsx) → tables (values, formulas, dates)
//! - Export: tables → Excel (.xlsx) with formulas
//!
//! Date cells export with their strftime number format translated to an
//! Excel format code (`yyyy-mm-dd` when unset or untranslatable). calamine
//! does not expose cell styles, so imported dates carry no number format and
//! their display text is ISO `YYYY-MM-DD`.

mod exporter;
mod importer;

pub use exporter::ExcelExporter;
pub use importer::ExcelImporter;

use crate::error::TabulaResult;
use crate::store::MemoryStore;
use std::path::Path;

/// Load a workbook from disk
pub fn load_workbook<P: AsRef<Path>>(path: P) -> TabulaResult<MemoryStore> {
    ExcelImporter::new(path).import()
}

/// Save a store as a workbook, one worksheet per table
pub fn save_workbook<P: AsRef<Path>>(store: &MemoryStore, path: P) -> TabulaResult<()> {
    ExcelExporter::new(store).export(path.as_ref())
}

//! Excel import/export tests through the transcoding core

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tabula::config::TranscodeOptions;
use tabula::core::{decode, upsert, write_records, WriteMode};
use tabula::error::TabulaError;
use tabula::excel::{load_workbook, save_workbook, ExcelExporter, ExcelImporter};
use tabula::store::{MemoryStore, TableStore};
use tabula::types::{CellValue, Origin, Record};
use tempfile::TempDir;

fn sample_store() -> MemoryStore {
    MemoryStore::new()
        .with_rows(
            "People",
            vec![
                vec!["Name".into(), "Age".into(), "Member".into()],
                vec!["Alice".into(), 30.into(), true.into()],
                vec!["Bob".into(), 25.into(), false.into()],
            ],
        )
        .with_rows("Notes", vec![vec!["Text".into()], vec!["hello".into()]])
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUND TRIP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_workbook_round_trip_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.xlsx");

    let store = sample_store();
    save_workbook(&store, &path).unwrap();
    assert!(path.exists());

    let loaded = load_workbook(&path).unwrap();
    let names: Vec<&String> = loaded.table_names().collect();
    assert_eq!(names, vec!["People", "Notes"]);
    assert_eq!(loaded.rows("People").unwrap(), store.rows("People").unwrap());
    assert_eq!(loaded.rows("Notes").unwrap(), store.rows("Notes").unwrap());
}

#[test]
fn test_workbook_round_trip_formula_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("formulas.xlsx");

    let mut store = sample_store();
    store
        .write_formula("People", Origin::new(4, 2), "=SUM(B2:B3)")
        .unwrap();
    ExcelExporter::new(&store).export(&path).unwrap();

    let loaded = ExcelImporter::new(&path).import().unwrap();
    let sheet = loaded.table("People").unwrap();
    assert_eq!(sheet.formula(Origin::new(4, 2)), Some("=SUM(B2:B3)"));
    assert_eq!(sheet.formula(Origin::new(2, 2)), None);
}

#[test]
fn test_workbook_round_trip_dates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dates.xlsx");
    let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    let store = MemoryStore::new().with_rows(
        "Events",
        vec![
            vec!["Event".into(), "When".into()],
            vec!["Launch".into(), day.into()],
        ],
    );
    save_workbook(&store, &path).unwrap();

    let loaded = load_workbook(&path).unwrap();
    let when = loaded.table("Events").unwrap().value(Origin::new(2, 2));
    assert!(when.is_date(), "expected a date, got {:?}", when);
    assert_eq!(when.as_text(), "2024-03-15");
}

#[test]
fn test_custom_date_format_exports_as_date() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("formatted.xlsx");
    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    let mut store = MemoryStore::new().with_rows(
        "Events",
        vec![
            vec!["Event".into(), "When".into(), "Other".into()],
            vec!["Launch".into(), day.into(), day.into()],
        ],
    );
    let sheet = store.table_mut("Events").unwrap();
    sheet.set_number_format(Origin::new(2, 2), "%d/%m/%Y");
    // No Excel equivalent: falls back to the default date format
    sheet.set_number_format(Origin::new(2, 3), "%s");
    save_workbook(&store, &path).unwrap();

    let loaded = load_workbook(&path).unwrap();
    let sheet = loaded.table("Events").unwrap();
    for col in [2, 3] {
        let when = sheet.value(Origin::new(2, col));
        assert!(when.is_date(), "expected a date, got {:?}", when);
        assert_eq!(when.as_text(), "2024-01-02");
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TRANSCODING ON FILES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_decode_after_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("decode.xlsx");
    save_workbook(&sample_store(), &path).unwrap();

    let store = load_workbook(&path).unwrap();
    let records = decode(&store, "People", &TranscodeOptions::default())
        .unwrap()
        .into_records();

    assert_eq!(
        records,
        vec![
            Record::new()
                .with("Name", "Alice")
                .with("Age", 30)
                .with("Member", true),
            Record::new()
                .with("Name", "Bob")
                .with("Age", 25)
                .with("Member", false),
        ]
    );
}

#[test]
fn test_upsert_then_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("upsert.xlsx");
    save_workbook(&sample_store(), &path).unwrap();

    let mut store = load_workbook(&path).unwrap();
    let opts = TranscodeOptions::default();
    upsert(
        &mut store,
        "People",
        &[
            Record::new().with("Name", "Bob").with("Age", 26),
            Record::new().with("Name", "Carl").with("Age", 40),
        ],
        "Name",
        &opts,
    )
    .unwrap();
    save_workbook(&store, &path).unwrap();

    let reloaded = load_workbook(&path).unwrap();
    let records = decode(&reloaded, "People", &opts).unwrap().into_records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].get("Age"), Some(&CellValue::from(26)));
    assert_eq!(records[2], Record::new().with("Name", "Carl").with("Age", 40));
}

#[test]
fn test_overwrite_keeps_formula_across_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("overwrite.xlsx");

    let mut store = MemoryStore::new().with_rows(
        "Totals",
        vec![
            vec!["Item".into(), "Amount".into(), "Double".into()],
            vec!["a".into(), 2.into(), CellValue::Empty],
        ],
    );
    store
        .write_formula("Totals", Origin::new(2, 3), "=B2*2")
        .unwrap();

    write_records(
        &mut store,
        "Totals",
        &[Record::new().with("Item", "b").with("Amount", 5)],
        WriteMode::Overwrite,
        &TranscodeOptions::default().with_preserve_formulas(true),
    )
    .unwrap();
    save_workbook(&store, &path).unwrap();

    let reloaded = load_workbook(&path).unwrap();
    let sheet = reloaded.table("Totals").unwrap();
    assert_eq!(sheet.formula(Origin::new(2, 3)), Some("=B2*2"));
    assert_eq!(sheet.value(Origin::new(2, 1)), CellValue::from("b"));
    assert_eq!(sheet.value(Origin::new(2, 2)), CellValue::from(5));
}

// ═══════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_load_missing_workbook() {
    let dir = TempDir::new().unwrap();
    let err = load_workbook(dir.path().join("missing.xlsx")).unwrap_err();
    assert!(matches!(err, TabulaError::Import(_)));
}

#[test]
fn test_load_non_excel_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.xlsx");
    std::fs::write(&path, "not a zip archive").unwrap();
    let err = load_workbook(&path).unwrap_err();
    assert!(matches!(err, TabulaError::Import(_)));
}

#[test]
fn test_export_invalid_sheet_name() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new().with_rows("bad[name]", vec![vec!["x".into()]]);
    let err = save_workbook(&store, dir.path().join("bad.xlsx")).unwrap_err();
    assert!(matches!(err, TabulaError::Export(_)));
}

#[test]
fn test_export_row_beyond_u32_is_error() {
    let dir = TempDir::new().unwrap();
    let mut store = MemoryStore::new().with_rows("Wide", vec![vec!["x".into()]]);
    // Would wrap to row 2 under a truncating cast
    let far = (u32::MAX as usize) + 2;
    store
        .write_block("Wide", Origin::new(far + 1, 1), &vec![vec!["y".into()]])
        .unwrap();
    let err = save_workbook(&store, dir.path().join("far.xlsx")).unwrap_err();
    assert!(matches!(err, TabulaError::Export(_)));
}

//! Keyed writes: upsert and find-and-update

use super::codec::encode;
use super::header::{data_extent, resolve_required_fields, FieldList};
use super::lines::{read_region, replay_formulas, write_cell, write_lines, LineRegion};
use super::strategy::append_line;
use crate::config::TranscodeOptions;
use crate::error::{TabulaError, TabulaResult};
use crate::store::TableStore;
use crate::types::{CellValue, CellVariant, Record};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of [`upsert`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Existing lines written to, one entry per matched record
    pub updated_lines: Vec<usize>,
    /// Lines appended for unmatched records
    pub inserted_lines: Vec<usize>,
    /// Single-cell writes issued by the update path
    pub cells_written: usize,
}

/// Outcome of [`find_and_update`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Requested fields that were written
    pub updated_fields: Vec<String>,
    /// Requested fields missing from the header
    pub skipped_fields: Vec<String>,
    pub warnings: Vec<String>,
    /// Distinct lines matched by at least one record, ascending
    pub matched_lines: Vec<usize>,
    pub unmatched_records: usize,
    pub cells_written: usize,
    pub formulas_restored: usize,
}

/// Key used to compare match-field values; blank values never match
fn match_key(value: &CellValue) -> Option<String> {
    if value.is_blank() {
        None
    } else {
        Some(value.as_text())
    }
}

/// Map match-field key → first line holding it
fn index_match_field<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    fields: &FieldList,
    match_field: &str,
    opts: &TranscodeOptions,
) -> TabulaResult<HashMap<String, usize>> {
    let offset = *fields
        .offsets_of(match_field)
        .last()
        .ok_or_else(|| {
            TabulaError::NotFound(format!(
                "match field '{}' in header of table '{}'",
                match_field, table
            ))
        })?;

    let mut index = HashMap::new();
    let Some((first_line, count)) = data_extent(store, table, opts)? else {
        return Ok(index);
    };

    let column = read_region(
        store,
        table,
        opts.orientation(),
        LineRegion::field(first_line, count, offset + 1),
        CellVariant::Value,
    )?;
    for (i, cell) in column.iter().enumerate() {
        if let Some(key) = cell.first().and_then(match_key) {
            index.entry(key).or_insert(first_line + i);
        }
    }
    Ok(index)
}

fn require_match_field(match_field: &str) -> TabulaResult<()> {
    if match_field.trim().is_empty() {
        return Err(TabulaError::InvalidParameters(
            "match field must be a non-empty field name".to_string(),
        ));
    }
    Ok(())
}

/// Update records whose `match_field` value already exists, append the rest.
///
/// Updates write only the record's own fields, one cell at a time, at the
/// first line holding the key. Inserts are appended in one block after the
/// last populated line, padded like any encoded record.
pub fn upsert<S: TableStore + ?Sized>(
    store: &mut S,
    table: &str,
    records: &[Record],
    match_field: &str,
    opts: &TranscodeOptions,
) -> TabulaResult<UpsertReport> {
    opts.validate()?;
    require_match_field(match_field)?;
    let orientation = opts.orientation();
    let fields = resolve_required_fields(&*store, table, opts)?;
    let index = index_match_field(&*store, table, &fields, match_field, opts)?;

    let mut report = UpsertReport::default();
    let mut inserts: Vec<Record> = Vec::new();

    for record in records {
        let matched = record
            .get(match_field)
            .and_then(match_key)
            .and_then(|key| index.get(&key).copied());
        let Some(line) = matched else {
            inserts.push(record.clone());
            continue;
        };

        for (name, value) in record.iter() {
            for offset in fields.offsets_of(name) {
                write_cell(store, table, orientation, line, offset + 1, value.clone())?;
                report.cells_written += 1;
            }
        }
        report.updated_lines.push(line);
    }

    if !inserts.is_empty() {
        let first = append_line(&*store, table, opts)?;
        let lines = encode(&fields, &inserts);
        write_lines(store, table, orientation, first, 1, &lines)?;
        report.inserted_lines = (first..first + lines.len()).collect();
    }

    debug!(
        table,
        match_field,
        updated = report.updated_lines.len(),
        inserted = report.inserted_lines.len(),
        "upsert complete"
    );
    Ok(report)
}

/// Update the named `target_fields` of lines matched on `match_field`.
///
/// Each target field costs one read and one write of its whole column (row
/// in pivot). Target fields missing from the header are skipped with a
/// warning; unmatched records are ignored. Nothing is ever inserted.
pub fn find_and_update<S, F>(
    store: &mut S,
    table: &str,
    records: &[Record],
    match_field: &str,
    target_fields: &[F],
    opts: &TranscodeOptions,
) -> TabulaResult<UpdateReport>
where
    S: TableStore + ?Sized,
    F: AsRef<str>,
{
    opts.validate()?;
    require_match_field(match_field)?;
    if target_fields.is_empty() {
        return Err(TabulaError::InvalidParameters(
            "at least one target field is required".to_string(),
        ));
    }
    let orientation = opts.orientation();
    let fields = resolve_required_fields(&*store, table, opts)?;
    let index = index_match_field(&*store, table, &fields, match_field, opts)?;

    let mut report = UpdateReport::default();

    // (line, record) pairs; later records for the same line win
    let mut matches: Vec<(usize, &Record)> = Vec::new();
    for record in records {
        match record
            .get(match_field)
            .and_then(match_key)
            .and_then(|key| index.get(&key).copied())
        {
            Some(line) => matches.push((line, record)),
            None => report.unmatched_records += 1,
        }
    }
    report.matched_lines = matches.iter().map(|(line, _)| *line).collect();
    report.matched_lines.sort_unstable();
    report.matched_lines.dedup();

    let extent = data_extent(&*store, table, opts)?;

    for target in target_fields {
        let name = target.as_ref();
        let offsets = fields.offsets_of(name);
        if offsets.is_empty() {
            let message = format!(
                "field '{}' not found in header of table '{}', skipped",
                name, table
            );
            if !opts.mute {
                warn!("{}", message);
            }
            report.skipped_fields.push(name.to_string());
            report.warnings.push(message);
            continue;
        }

        let Some((first_line, count)) = extent else {
            continue;
        };

        for offset in offsets {
            let region = LineRegion::field(first_line, count, offset + 1);
            let mut column = read_region(&*store, table, orientation, region, CellVariant::Value)?;
            let formulas = if opts.preserve_formulas {
                read_region(&*store, table, orientation, region, CellVariant::FormulaText)?
            } else {
                Vec::new()
            };

            let mut touched = vec![false; count];
            for (line, record) in &matches {
                if let Some(value) = record.get(name) {
                    let i = line - first_line;
                    column[i] = vec![value.clone()];
                    touched[i] = true;
                }
            }
            if !touched.contains(&true) {
                continue;
            }

            write_lines(store, table, orientation, first_line, offset + 1, &column)?;
            report.cells_written += touched.iter().filter(|t| **t).count();
            report.formulas_restored +=
                replay_formulas(store, table, orientation, region, &formulas, |i, _| {
                    touched[i]
                })?;
        }
        report.updated_fields.push(name.to_string());
    }

    debug!(
        table,
        match_field,
        fields = report.updated_fields.len(),
        skipped = report.skipped_fields.len(),
        matched = report.matched_lines.len(),
        "find-and-update complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Matrix, Origin};
    use pretty_assertions::assert_eq;

    fn people() -> MemoryStore {
        MemoryStore::new().with_rows(
            "People",
            vec![
                vec!["Name".into(), "Age".into(), "City".into()],
                vec!["Alice".into(), 30.into(), "Oslo".into()],
                vec!["Bob".into(), 25.into(), "Rome".into()],
                vec!["Bob".into(), 99.into(), "Nice".into()],
            ],
        )
    }

    #[test]
    fn test_upsert_first_duplicate_wins() {
        let mut store = people();
        let report = upsert(
            &mut store,
            "People",
            &[Record::new().with("Name", "Bob").with("Age", 26)],
            "Name",
            &TranscodeOptions::default(),
        )
        .unwrap();
        assert_eq!(report.updated_lines, vec![3]);
        assert!(report.inserted_lines.is_empty());
        let sheet = store.table("People").unwrap();
        assert_eq!(sheet.value(Origin::new(3, 2)), CellValue::from(26));
        assert_eq!(sheet.value(Origin::new(4, 2)), CellValue::from(99));
        assert_eq!(sheet.value(Origin::new(3, 3)), CellValue::from("Rome"));
    }

    #[test]
    fn test_upsert_inserts_when_key_missing_or_blank() {
        let mut store = people();
        let report = upsert(
            &mut store,
            "People",
            &[
                Record::new().with("Age", 1),
                Record::new().with("Name", "Dana").with("City", "Lima"),
            ],
            "Name",
            &TranscodeOptions::default(),
        )
        .unwrap();
        assert_eq!(report.inserted_lines, vec![5, 6]);
        let rows = store.rows("People").unwrap();
        let expected: Matrix = vec![
            vec![CellValue::Empty, 1.into(), CellValue::Empty],
            vec!["Dana".into(), CellValue::Empty, "Lima".into()],
        ];
        assert_eq!(rows[4..].to_vec(), expected);
    }

    #[test]
    fn test_upsert_matches_numbers_by_text() {
        let mut store = MemoryStore::new().with_rows(
            "T",
            vec![
                vec!["Id".into(), "V".into()],
                vec![7.into(), "old".into()],
            ],
        );
        let report = upsert(
            &mut store,
            "T",
            &[Record::new().with("Id", "7").with("V", "new")],
            "Id",
            &TranscodeOptions::default(),
        )
        .unwrap();
        assert_eq!(report.updated_lines, vec![2]);
        assert_eq!(
            store.table("T").unwrap().value(Origin::new(2, 2)),
            CellValue::from("new")
        );
    }

    #[test]
    fn test_upsert_rejects_blank_match_field() {
        let mut store = people();
        let err = upsert(&mut store, "People", &[], " ", &TranscodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, TabulaError::InvalidParameters(_)));
    }

    #[test]
    fn test_upsert_unknown_match_field() {
        let mut store = people();
        let err = upsert(&mut store, "People", &[], "Email", &TranscodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, TabulaError::NotFound(_)));
    }

    #[test]
    fn test_find_and_update_skips_unknown_fields() {
        let mut store = people();
        let report = find_and_update(
            &mut store,
            "People",
            &[
                Record::new().with("Name", "Alice").with("City", "Bergen").with("Age", 31),
                Record::new().with("Name", "Zoe").with("City", "Paris"),
            ],
            "Name",
            &["City", "Email"],
            &TranscodeOptions::default().muted(),
        )
        .unwrap();
        assert_eq!(report.updated_fields, vec!["City"]);
        assert_eq!(report.skipped_fields, vec!["Email"]);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.unmatched_records, 1);
        assert_eq!(report.matched_lines, vec![2]);
        assert_eq!(report.cells_written, 1);

        let sheet = store.table("People").unwrap();
        assert_eq!(sheet.value(Origin::new(2, 3)), CellValue::from("Bergen"));
        // Age was not a target field
        assert_eq!(sheet.value(Origin::new(2, 2)), CellValue::from(30));
        assert_eq!(store.last_populated_row("People").unwrap(), 4);
    }

    #[test]
    fn test_find_and_update_restores_formulas_on_untouched_lines() {
        let mut store = people();
        store
            .write_formula("People", Origin::new(3, 2), "=20+5")
            .unwrap();
        let report = find_and_update(
            &mut store,
            "People",
            &[Record::new().with("Name", "Alice").with("Age", 31)],
            "Name",
            &["Age".to_string()],
            &TranscodeOptions::default().with_preserve_formulas(true),
        )
        .unwrap();
        assert_eq!(report.formulas_restored, 1);
        let sheet = store.table("People").unwrap();
        assert_eq!(sheet.value(Origin::new(2, 2)), CellValue::from(31));
        assert_eq!(sheet.formula(Origin::new(3, 2)), Some("=20+5"));
    }

    #[test]
    fn test_find_and_update_requires_targets() {
        let mut store = people();
        let none: [&str; 0] = [];
        let err = find_and_update(
            &mut store,
            "People",
            &[],
            "Name",
            &none,
            &TranscodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TabulaError::InvalidParameters(_)));
    }
}

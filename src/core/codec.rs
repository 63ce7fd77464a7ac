//! Row/column ↔ record transcoding

use super::header::{data_extent, resolve_fields, FieldList};
use super::lines::{last_position, read_region, LineRegion};
use crate::config::TranscodeOptions;
use crate::error::TabulaResult;
use crate::store::TableStore;
use crate::types::{CellValue, CellVariant, Decoded, Matrix, Record};
use tracing::debug;

/// Decode the data lines of `table` into records.
///
/// Lines whose cells are all blank are dropped before field mapping. Blank
/// cells never produce a key. With `use_display_dates`, date cells yield
/// their displayed text instead of the date.
pub fn decode<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    opts: &TranscodeOptions,
) -> TabulaResult<Decoded> {
    opts.validate()?;
    let orientation = opts.orientation();
    let fields = resolve_fields(store, table, opts)?;

    let Some((first_line, count)) = data_extent(store, table, opts)? else {
        debug!(table, start_line = opts.start_line, "no data lines");
        return Ok(Decoded::EmptyTable);
    };

    let width = last_position(store, table, orientation)?.max(fields.span());
    let region = LineRegion::new(first_line, count, width);
    let values = read_region(store, table, orientation, region, CellVariant::Value)?;
    let display = if opts.use_display_dates {
        Some(read_region(
            store,
            table,
            orientation,
            region,
            CellVariant::DisplayText,
        )?)
    } else {
        None
    };

    let records: Vec<Record> = values
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.iter().all(CellValue::is_blank))
        .map(|(i, line)| decode_line(&fields, line, display.as_ref().map(|d| d[i].as_slice())))
        .collect();

    debug!(
        table,
        lines = count,
        records = records.len(),
        "decoded table"
    );
    Ok(Decoded::Records(records))
}

/// Build one record from a line of cells
pub fn decode_line(fields: &FieldList, line: &[CellValue], display: Option<&[CellValue]>) -> Record {
    let mut record = Record::new();
    for field in fields.iter() {
        let Some(value) = line.get(field.offset) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        let value = match (value, display.and_then(|d| d.get(field.offset))) {
            (CellValue::Date(_), Some(shown)) if !shown.is_blank() => {
                CellValue::Text(shown.as_text())
            }
            _ => value.clone(),
        };
        record.insert(field.name.clone(), value);
    }
    record
}

/// Encode one record as a line spanning every header position.
///
/// Field positions take the record's value (blank when absent); positions
/// under blank headers are left blank.
pub fn encode_line(fields: &FieldList, record: &Record) -> Vec<CellValue> {
    let mut line = vec![CellValue::Empty; fields.span()];
    for field in fields.iter() {
        line[field.offset] = record.value_or_blank(&field.name);
    }
    line
}

/// Encode records as line-major cells. Keys missing from the header are dropped.
pub fn encode(fields: &FieldList, records: &[Record]) -> Matrix {
    records.iter().map(|r| encode_line(fields, r)).collect()
}

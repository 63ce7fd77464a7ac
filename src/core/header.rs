//! Header resolution: one header line → ordered field list

use super::lines::{ensure_table, last_line, last_position, read_region, LineRegion};
use crate::config::TranscodeOptions;
use crate::error::{TabulaError, TabulaResult};
use crate::store::TableStore;
use crate::types::{CellValue, CellVariant, Orientation};
use tracing::debug;

/// A named field and its zero-based offset on the header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub offset: usize,
}

impl Field {
    /// 1-based position (column in normal orientation, row in pivot)
    pub fn position(&self) -> usize {
        self.offset + 1
    }
}

/// Ordered fields of a header line. Blank header cells never become fields,
/// but the remaining fields keep their original offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList {
    fields: Vec<Field>,
}

impl FieldList {
    /// Build from the raw cells of a header line.
    ///
    /// With `strict`, a repeated name is a [`TabulaError::DuplicateHeader`];
    /// otherwise both fields are kept and share one record key.
    pub fn from_header(cells: &[CellValue], strict: bool) -> TabulaResult<Self> {
        let mut fields: Vec<Field> = Vec::new();
        for (offset, cell) in cells.iter().enumerate() {
            let name = cell.as_text();
            if name.trim().is_empty() {
                continue;
            }
            if strict {
                if let Some(existing) = fields.iter().find(|f| f.name == name) {
                    return Err(TabulaError::DuplicateHeader {
                        name,
                        first: existing.position(),
                        second: offset + 1,
                    });
                }
            }
            fields.push(Field { name, offset });
        }
        Ok(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Offsets of every field called `name` (more than one only when aliased)
    pub fn offsets_of(&self, name: &str) -> Vec<usize> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .map(|f| f.offset)
            .collect()
    }

    /// Number of positions from the first header cell through the last field
    pub fn span(&self) -> usize {
        self.fields.iter().map(|f| f.offset + 1).max().unwrap_or(0)
    }
}

/// Resolve the field list of `table` from `opts.header_line`.
///
/// Normal orientation reads that row across all populated columns; pivot
/// reads that column across all populated rows. `opts.field_cap` limits how
/// many positions are read. An empty header line yields an empty list.
pub fn resolve_fields<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    opts: &TranscodeOptions,
) -> TabulaResult<FieldList> {
    ensure_table(store, table)?;
    let orientation = opts.orientation();
    let mut width = last_position(store, table, orientation)?;
    if let Some(cap) = opts.field_cap {
        width = width.min(cap);
    }

    let header = read_region(
        store,
        table,
        orientation,
        LineRegion::new(opts.header_line, 1, width),
        CellVariant::Value,
    )?
    .pop()
    .unwrap_or_default();

    let fields = FieldList::from_header(&header, opts.strict_headers)?;
    debug!(
        table,
        header_line = opts.header_line,
        orientation = orientation_name(orientation),
        fields = fields.len(),
        "resolved header"
    );
    Ok(fields)
}

/// Field list that must not be empty (write paths)
pub(crate) fn resolve_required_fields<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    opts: &TranscodeOptions,
) -> TabulaResult<FieldList> {
    let fields = resolve_fields(store, table, opts)?;
    if fields.is_empty() {
        return Err(TabulaError::NotFound(format!(
            "header {} {} of table '{}' is empty",
            opts.orientation().line_noun(),
            opts.header_line,
            table
        )));
    }
    Ok(fields)
}

/// Last populated line, used by callers that already resolved fields
pub(crate) fn data_extent<S: TableStore + ?Sized>(
    store: &S,
    table: &str,
    opts: &TranscodeOptions,
) -> TabulaResult<Option<(usize, usize)>> {
    let last = last_line(store, table, opts.orientation())?;
    if last < opts.start_line {
        Ok(None)
    } else {
        Ok(Some((opts.start_line, last - opts.start_line + 1)))
    }
}

fn orientation_name(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Normal => "normal",
        Orientation::Pivot => "pivot",
    }
}

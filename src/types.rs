use chrono::{NaiveDate, NaiveDateTime, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Cell values
//==============================================================================

/// Content of a single cell.
///
/// Serialized untagged so records map naturally onto JSON objects:
/// `null`, booleans, numbers, ISO date-time strings and plain strings.
/// Variant order matters for deserialization: a string is only read as a
/// [`CellValue::Date`] when it parses as `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// Blank cells are `Empty` or the empty string
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, CellValue::Date(_))
    }

    /// Canonical text form: integral numbers lose their `.0`, dates at
    /// midnight render as `YYYY-MM-DD`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Date(dt) => format_date(dt, None),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Render a date with an optional strftime pattern
pub fn format_date(dt: &NaiveDateTime, pattern: Option<&str>) -> String {
    match pattern {
        Some(p) => dt.format(p).to_string(),
        None if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 => {
            dt.format("%Y-%m-%d").to_string()
        }
        None => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(dt)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d.and_time(chrono::NaiveTime::MIN))
    }
}

/// Rectangular block of cells, outer index = row (or line once oriented)
pub type Matrix = Vec<Vec<CellValue>>;

/// Transpose a matrix, padding short rows with `Empty`
pub fn transpose(matrix: &Matrix) -> Matrix {
    let width = matrix.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            matrix
                .iter()
                .map(|row| row.get(col).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

//==============================================================================
// Records
//==============================================================================

/// One keyed record: field name → value, in insertion order.
///
/// A missing key and a key holding [`CellValue::Empty`] both encode to a
/// blank cell, but only a present key counts as "supplied" for overlay and
/// upsert updates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, CellValue>);

impl Record {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.0.get(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Value to encode for `field`: absent and explicit empty both become `Empty`
    pub fn value_or_blank(&self, field: &str) -> CellValue {
        self.0.get(field).cloned().unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Result of decoding a table region
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Data extent present; lines that were entirely blank are dropped
    Records(Vec<Record>),
    /// Nothing populated at or after the start line
    EmptyTable,
}

impl Decoded {
    pub fn is_empty_table(&self) -> bool {
        matches!(self, Decoded::EmptyTable)
    }

    /// Records, treating an empty table as zero records
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Decoded::Records(records) => records,
            Decoded::EmptyTable => Vec::new(),
        }
    }
}

//==============================================================================
// Addressing
//==============================================================================

/// Which cell content a block read returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellVariant {
    /// Underlying value (number, date, text, ...)
    Value,
    /// Rendered text, as `Text` (or `Empty`)
    DisplayText,
    /// Formula text with leading `=`, as `Text` (or `Empty` when none)
    FormulaText,
}

/// 1-based cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin {
    pub row: usize,
    pub col: usize,
}

impl Origin {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            column_index_to_letter(self.col.saturating_sub(1)),
            self.row
        )
    }
}

/// Block dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Convert a zero-based column index to an Excel column letter
///
/// Examples:
/// - 0 → A
/// - 25 → Z
/// - 26 → AA
pub fn column_index_to_letter(index: usize) -> String {
    let mut result = String::new();
    let mut idx = index;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Whether records map to rows or to columns.
///
/// The core works in "lines" (records) and "positions" (fields); this type
/// maps those onto physical rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Records are rows, fields are columns
    #[default]
    Normal,
    /// Records are columns, fields are rows
    Pivot,
}

impl Orientation {
    pub fn from_pivot(pivot: bool) -> Self {
        if pivot {
            Orientation::Pivot
        } else {
            Orientation::Normal
        }
    }

    /// Physical cell for a (line, position) pair
    pub fn cell(&self, line: usize, position: usize) -> Origin {
        match self {
            Orientation::Normal => Origin::new(line, position),
            Orientation::Pivot => Origin::new(position, line),
        }
    }

    /// Physical shape for a block of `lines` × `positions`
    pub fn shape(&self, lines: usize, positions: usize) -> Shape {
        match self {
            Orientation::Normal => Shape::new(lines, positions),
            Orientation::Pivot => Shape::new(positions, lines),
        }
    }

    /// Physical matrix → line-major matrix
    pub fn to_lines(&self, matrix: Matrix) -> Matrix {
        match self {
            Orientation::Normal => matrix,
            Orientation::Pivot => transpose(&matrix),
        }
    }

    /// Line-major matrix → physical matrix
    pub fn to_physical(&self, lines: Matrix) -> Matrix {
        match self {
            Orientation::Normal => lines,
            Orientation::Pivot => transpose(&lines),
        }
    }

    pub fn line_noun(&self) -> &'static str {
        match self {
            Orientation::Normal => "row",
            Orientation::Pivot => "column",
        }
    }
}

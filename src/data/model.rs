use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a result row
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the JSON scalars the service emits.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            // Shortest round-trip form: 0.85 stays "0.85", 1.0 becomes "1".
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Text form of the cell, borrowing when the value is already a string.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Row – one analysis interval
// ---------------------------------------------------------------------------

/// Key of the timestamp the date filter matches against.
pub const START_TIME: &str = "start_time";

/// One record of the processed result.
///
/// Keys keep the order in which the service emitted them; the CSV header is
/// taken from that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: IndexMap<String, CellValue>,
}

impl Row {
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    /// Column names in their natural order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Text of the `start_time` field, if present.
    pub fn start_time(&self) -> Option<Cow<'_, str>> {
        self.get(START_TIME).map(CellValue::text)
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Row {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ResultSet – everything returned by one upload
// ---------------------------------------------------------------------------

/// The ordered rows of the most recent successful upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    /// Column names of the first row, used as the table header.
    pub column_names: Vec<String>,
}

impl ResultSet {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let column_names = rows
            .first()
            .map(|r| r.keys().map(str::to_string).collect())
            .unwrap_or_default();
        ResultSet { rows, column_names }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

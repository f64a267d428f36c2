use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, as produced by the file readers.
/// Option lists live in `BTreeSet`s downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Spreadsheet date/time kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) | CellValue::Date(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    /// Textual form of the cell as it would appear in a delimited file.
    /// `Null` renders as the empty string.
    pub fn raw_text(&self) -> String {
        self.to_string()
    }

    /// Numeric view of the cell, without any coercion of text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar year.
    ///
    /// Accepts integers, integral floats (spreadsheets store `2021` as
    /// `2021.0`) and numeric text.
    pub fn as_year(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            CellValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            }
            _ => None,
        }
    }

    /// `true` for the "no selection" sentinels: null and empty/blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Categorical equality: identical cells, or cells whose textual form
    /// matches (a product code read as `1234` equals the text `"1234"`).
    pub fn matches(&self, other: &CellValue) -> bool {
        self == other || self.raw_text() == other.raw_text()
    }
}

// ---------------------------------------------------------------------------
// CostTable – the ingested table
// ---------------------------------------------------------------------------

/// An ordered table of cells with pre-computed distinct values per column.
///
/// Never mutated once built; normalization and filtering produce new values.
#[derive(Debug, Clone)]
pub struct CostTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    unique_values: Vec<BTreeSet<CellValue>>,
}

impl CostTable {
    /// Build a table, padding short rows with `Null` and truncating long
    /// ones to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows: Vec<Vec<CellValue>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();

        let mut unique_values = vec![BTreeSet::new(); width];
        for row in &rows {
            for (set, cell) in unique_values.iter_mut().zip(row) {
                set.insert(cell.clone());
            }
        }

        CostTable {
            columns,
            rows,
            unique_values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sorted distinct values of the column at `index`.
    pub fn unique_values(&self, index: usize) -> Option<&BTreeSet<CellValue>> {
        self.unique_values.get(index)
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        &self.rows[row][column]
    }

    /// The first `n` rows, for previews.
    pub fn head(&self, n: usize) -> &[Vec<CellValue>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

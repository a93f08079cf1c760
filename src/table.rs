use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// A single value from an uploaded report.
///
/// `Empty` stands for a blank spreadsheet cell or an empty CSV field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// Builds a cell from raw text, mapping the empty string to `Empty`.
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Key used for deduplication. Ints and integral floats share a key so that
    /// `42` and `42.0` collapse; all empty cells share one key.
    pub fn dedup_key(&self) -> String {
        match self {
            Cell::Empty => "e:".to_string(),
            Cell::Text(s) => format!("t:{}", s),
            Cell::Int(i) => format!("n:{}", i),
            Cell::Float(f) if f.fract() == 0.0 && f.is_finite() && f.abs() < 9.0e15 => {
                format!("n:{}", *f as i64)
            }
            Cell::Float(f) => format!("f:{}", f.to_bits()),
            Cell::Bool(b) => format!("b:{}", b),
        }
    }

    /// JSON value for outbound payloads. Missing values become `""`.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::String(String::new()),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(String::new())),
            Cell::Bool(b) => Value::Bool(*b),
        }
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        match self {
            Cell::Empty => hasher.update([0u8]),
            Cell::Text(s) => {
                hasher.update([1u8]);
                hash_str(hasher, s);
            }
            Cell::Int(i) => {
                hasher.update([2u8]);
                hasher.update(i.to_le_bytes());
            }
            Cell::Float(f) => {
                hasher.update([3u8]);
                hasher.update(f.to_bits().to_le_bytes());
            }
            Cell::Bool(b) => hasher.update([4u8, *b as u8]),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Header row plus data rows of one uploaded sheet.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates a table, padding short rows with `Empty` and cutting long ones.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Returns the names from `required` that are not columns of this table,
    /// in the order given.
    pub fn missing_columns<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        required
            .into_iter()
            .filter(|name| self.column_index(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// The cells of the first column with this exact name, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Keeps the rows for which `keep` returns true, preserving order.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r.as_slice())).cloned().collect(),
        }
    }

    /// Rewrites one column in place.
    pub fn map_column<F>(&mut self, column: usize, mut f: F)
    where
        F: FnMut(&Cell) -> Cell,
    {
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(column) {
                *cell = f(cell);
            }
        }
    }

    /// Strips leading and trailing whitespace from every header name.
    pub fn trim_headers(&mut self) {
        for h in &mut self.headers {
            let trimmed = h.trim();
            if trimmed.len() != h.len() {
                *h = trimmed.to_string();
            }
        }
    }

    /// SHA-256 over a length-prefixed, type-tagged encoding of headers and cells.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.headers.len() as u64).to_le_bytes());
        for h in &self.headers {
            hash_str(&mut hasher, h);
        }
        hasher.update((self.rows.len() as u64).to_le_bytes());
        for row in &self.rows {
            for cell in row {
                cell.hash_into(&mut hasher);
            }
        }
        hex::encode(hasher.finalize())
    }
}

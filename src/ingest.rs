use crate::config::InputConfig;
use crate::error::{LeadError, Result};
use crate::table::{Cell, Table};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Upload formats accepted for sales reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Xlsx,
    Xls,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" => Ok(TableFormat::Xlsx),
            "xls" => Ok(TableFormat::Xls),
            _ => Err(LeadError::MalformedInput(format!(
                "unsupported file type '{}', expected .csv, .xlsx or .xls",
                path.display()
            ))),
        }
    }
}

/// Reads a report from disk, picking the parser from the file extension.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_path(path: &Path, input: &InputConfig) -> Result<Table> {
    let format = TableFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes, format, input)
}

/// Parses an uploaded report. Only the first sheet of a workbook is read and
/// the first row is always the header.
pub fn load_bytes(bytes: &[u8], format: TableFormat, input: &InputConfig) -> Result<Table> {
    let mut table = match format {
        TableFormat::Csv => {
            let mut table = parse_csv(bytes, input.delimiter)?;
            if input.infer_types {
                infer_column_types(&mut table);
            }
            table
        }
        TableFormat::Xlsx => {
            let mut workbook = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| LeadError::MalformedInput(format!("failed to open workbook: {}", e)))?;
            first_sheet(workbook.worksheet_range_at(0))?
        }
        TableFormat::Xls => {
            let mut workbook = Xls::new(Cursor::new(bytes))
                .map_err(|e| LeadError::MalformedInput(format!("failed to open workbook: {}", e)))?;
            first_sheet(workbook.worksheet_range_at(0))?
        }
    };

    if input.trim_headers {
        table.trim_headers();
    }

    info!(rows = table.len(), columns = table.headers().len(), ?format, "Loaded report");
    Ok(table)
}

/// Decodes bytes as UTF-8 (dropping a BOM), falling back to Windows-1252,
/// which is what spreadsheet tools in pt-BR locales write by default.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!("Report is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn header_name(index: usize, raw: &str) -> String {
    if raw.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        raw.to_string()
    }
}

fn parse_csv(bytes: &[u8], delimiter: char) -> Result<Table> {
    if !delimiter.is_ascii() {
        return Err(LeadError::Config(format!("delimiter '{}' must be a single ASCII character", delimiter)));
    }
    let content = decode_text(bytes);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LeadError::MalformedInput(format!("failed to read header row: {}", e)))?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(i, h))
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.starts_with("Unnamed: ")) {
        return Err(LeadError::MalformedInput("file has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| LeadError::MalformedInput(format!("failed to parse row {}: {}", index + 1, e)))?;
        if record.len() > headers.len() {
            return Err(LeadError::MalformedInput(format!(
                "row {} has {} fields but the header has {}",
                index + 1,
                record.len(),
                headers.len()
            )));
        }
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    debug!(rows = rows.len(), "Parsed delimited text");
    Ok(Table::new(headers, rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "true" | "TRUE" => Some(true),
        "False" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

fn value_kind(s: &str) -> ColumnKind {
    if s.parse::<i64>().is_ok() {
        ColumnKind::Int
    } else if s.parse::<f64>().is_ok() {
        ColumnKind::Float
    } else if parse_bool(s).is_some() {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

/// Picks one kind for a whole column. Ints and floats widen to `Float`, and an
/// int column with blanks is `Float` too, since a blank is not an integer.
fn column_kind<'a>(cells: impl Iterator<Item = &'a Cell>) -> ColumnKind {
    let mut kind = None;
    let mut has_blank = false;
    for cell in cells {
        let text = match cell {
            Cell::Empty => {
                has_blank = true;
                continue;
            }
            Cell::Text(s) => s.trim(),
            _ => return ColumnKind::Text,
        };
        kind = Some(match (kind, value_kind(text)) {
            (_, ColumnKind::Text) => return ColumnKind::Text,
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        });
    }
    match kind {
        Some(ColumnKind::Int) if has_blank => ColumnKind::Float,
        Some(k) => k,
        None => ColumnKind::Text,
    }
}

fn typed_cell(cell: &Cell, kind: ColumnKind) -> Cell {
    let Cell::Text(raw) = cell else {
        return cell.clone();
    };
    let s = raw.trim();
    let typed = match kind {
        ColumnKind::Int => s.parse().ok().map(Cell::Int),
        ColumnKind::Float => s.parse().ok().map(Cell::Float),
        ColumnKind::Bool => parse_bool(s).map(Cell::Bool),
        ColumnKind::Text => None,
    };
    typed.unwrap_or_else(|| cell.clone())
}

/// Gives delimited text the cell types a spreadsheet would have carried, so a
/// report dedups and serializes the same whichever format it was uploaded in.
fn infer_column_types(table: &mut Table) {
    for idx in 0..table.headers().len() {
        let kind = column_kind(table.rows().iter().map(|row| &row[idx]));
        if kind != ColumnKind::Text {
            debug!(column = %table.headers()[idx], ?kind, "Typed column");
            table.map_column(idx, |cell| typed_cell(cell, kind));
        }
    }
}

fn first_sheet<E: std::fmt::Display>(sheet: Option<std::result::Result<Range<Data>, E>>) -> Result<Table> {
    let range = sheet
        .ok_or_else(|| LeadError::MalformedInput("workbook has no worksheets".to_string()))?
        .map_err(|e| LeadError::MalformedInput(format!("failed to read worksheet: {}", e)))?;
    table_from_range(&range)
}

fn table_from_range(range: &Range<Data>) -> Result<Table> {
    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| LeadError::MalformedInput("worksheet has no header row".to_string()))?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, c)| header_name(i, &sheet_cell(c).to_string()))
        .collect();

    let data = rows.map(|r| r.iter().map(sheet_cell).collect()).collect();
    Ok(Table::new(headers, data))
}

fn sheet_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        // dates, durations and error cells keep their display form
        other => Cell::from_text(&other.to_string()),
    }
}

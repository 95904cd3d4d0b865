//! Byte payload → string grid.
//!
//! `.csv` uploads are read as delimited text; anything else is opened as a
//! workbook (xlsx, xlsm, xlsb, xls, ods) and its first worksheet is used.
//! Typing of the cells happens in [`super::Table`] once the timestamp and
//! label columns are known.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

/// Untyped decoded upload: header row plus string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// All cells of one column, in row order.
    pub fn column(&self, idx: usize) -> Vec<String> {
        self.rows.iter().map(|r| r[idx].clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    Empty,
    Csv(String),
    Workbook(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "file is empty"),
            Self::Csv(msg) => write!(f, "{msg}"),
            Self::Workbook(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode an upload, dispatching on the filename extension.
pub fn decode(bytes: &[u8], file_name: &str) -> Result<RawTable, DecodeError> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "csv" {
        decode_csv(bytes)
    } else {
        decode_workbook(bytes)
    }
}

pub fn decode_csv(bytes: &[u8]) -> Result<RawTable, DecodeError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DecodeError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| DecodeError::Csv(format!("failed to read headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let headers = dedupe_headers(headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::Csv(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

/// First worksheet of a workbook. The format is sniffed from the bytes, not
/// the extension.
pub fn decode_workbook(bytes: &[u8]) -> Result<RawTable, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DecodeError::Workbook(format!("failed to open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecodeError::Workbook("workbook has no worksheets".into()))?
        .map_err(|e| DecodeError::Workbook(format!("failed to read first worksheet: {e}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(DecodeError::Empty);
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell_text(cell) {
            name if name.is_empty() => format!("Unnamed: {i}"),
            name => name,
        })
        .collect();
    let headers = dedupe_headers(headers);

    let rows = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

/// Worksheet cell → the same text a CSV export would carry. Error cells read
/// as missing.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            None => dt.as_f64().to_string(),
        },
    }
}

/// Repeated header names get `.1`, `.2`, ... suffixes so every column is
/// addressable by name.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|h| {
            let count = seen.entry(h.clone()).or_insert(0);
            let name = if *count == 0 {
                h
            } else {
                format!("{h}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

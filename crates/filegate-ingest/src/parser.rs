//! Tabular file parsing
//!
//! The format is picked from the filename extension: `.csv` is read as
//! comma-separated UTF-8 text with a header row, `.xlsx` and `.xls` are read
//! from the first worksheet. Rows in which every cell is empty are skipped.
//! Header names are kept exactly as written; only a leading BOM is removed.

use crate::error::{IngestError, IngestResult};
use crate::grid::{CellValue, ParsedGrid};
use calamine::{Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::io::Cursor;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> IngestResult<Self> {
        match filegate_common::filename::extension(filename).as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") | Some("xls") => Ok(FileFormat::Spreadsheet),
            _ => Err(IngestError::Parse(format!(
                "unsupported file format: '{}'",
                filename
            ))),
        }
    }
}

/// Parse `bytes` into a grid using the format implied by `filename`.
pub fn parse(bytes: &[u8], filename: &str) -> IngestResult<ParsedGrid> {
    let format = FileFormat::from_filename(filename)?;
    let grid = match format {
        FileFormat::Csv => parse_csv(bytes)?,
        FileFormat::Spreadsheet => parse_spreadsheet(bytes)?,
    };
    debug!(
        filename,
        ?format,
        columns = grid.header().len(),
        rows = grid.len(),
        "Parsed file"
    );
    Ok(grid)
}

fn parse_csv(bytes: &[u8]) -> IngestResult<ParsedGrid> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Parse(format!("CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();
    if header.is_empty() {
        return Err(IngestError::Parse("file has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Parse(format!("CSV: {}", e)))?;
        let row: Vec<CellValue> = record.iter().map(CellValue::from_text).collect();
        if row.iter().all(CellValue::is_empty) {
            continue;
        }
        rows.push(row);
    }

    ParsedGrid::new(header, rows).map_err(IngestError::Parse)
}

fn parse_spreadsheet(bytes: &[u8]) -> IngestResult<ParsedGrid> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::Parse(format!("cannot open spreadsheet: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Parse("workbook has no sheets".to_string()))?
        .map_err(|e| IngestError::Parse(format!("cannot read first sheet: {}", e)))?;

    let mut sheet_rows = range.rows();
    let header: Vec<String> = sheet_rows
        .next()
        .ok_or_else(|| IngestError::Parse("file has no header row".to_string()))?
        .iter()
        .map(|cell| cell_value(cell).to_string())
        .collect();

    // Ranges span the used area, so trailing empty header cells are formatting noise.
    let width = header
        .iter()
        .rposition(|h| !h.is_empty())
        .map(|last| last + 1)
        .unwrap_or(0);
    if width == 0 {
        return Err(IngestError::Parse("file has no header row".to_string()));
    }
    let header = header[..width].to_vec();

    let rows = sheet_rows
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(CellValue::is_empty))
        .collect();

    ParsedGrid::new(header, rows).map_err(IngestError::Parse)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::from_text(s)),
        Data::DurationIso(s) => CellValue::from_text(s),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

/// Excel stores dates as days since 1899-12-30 (with the 1900 leap-year bug
/// folded into that epoch for every date after February 1900).
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let millis = ((serial - serial.trunc()) * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::try_days(days)? + Duration::try_milliseconds(millis)?)
}

//! In-memory tabular data produced by the parser

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// A single cell as read from the source file, before any typing rules apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// CSV fields are always text; an empty field is an empty cell.
    pub fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) if dt.time() == chrono::NaiveTime::MIN => {
                write!(f, "{}", dt.date().format("%Y-%m-%d"))
            },
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Header row plus data rows of one sheet.
///
/// Every row has exactly `header.len()` cells; the constructor pads short
/// rows with [`CellValue::Empty`] and rejects rows wider than the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedGrid {
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl ParsedGrid {
    pub fn new(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, String> {
        let width = header.len();
        let mut rows = rows;
        for (i, row) in rows.iter_mut().enumerate() {
            if row.len() > width {
                if row[width..].iter().any(|c| !c.is_empty()) {
                    return Err(format!(
                        "row {} has {} cells but the header has {}",
                        i + 2,
                        row.len(),
                        width
                    ));
                }
                row.truncate(width);
            }
            row.resize(width, CellValue::Empty);
        }
        Ok(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

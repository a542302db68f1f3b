//! Record normalization
//!
//! Turns a validated grid into a [`NormalizedBatch`]:
//!
//! 1. drop the trailing summary row when the profile asks for it
//! 2. select the declared fields in declared order, renaming them
//! 3. coerce every cell to its field type
//! 4. append the caller context to every record
//!
//! The first cell that fails coercion aborts the whole batch.

use crate::error::{IngestError, IngestResult};
use crate::grid::{CellValue, ParsedGrid};
use crate::profile::{ColumnLayout, DocumentProfile, FieldKind, FieldSpec};
use crate::record::{FieldValue, NormalizedBatch, NormalizedRecord};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, instrument};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M:%S"];

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Resolve the profile's context fields from request parameters.
///
/// Every declared field must be present and non-blank; typed fields must
/// parse.
pub fn bind_context(
    profile: &DocumentProfile,
    params: &HashMap<String, String>,
) -> IngestResult<Vec<(String, FieldValue)>> {
    profile
        .context
        .iter()
        .map(|field| {
            let raw = params
                .get(&field.name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| IngestError::MissingContext(field.name.clone()))?;

            let value = coerce_text(raw, field.kind).ok_or_else(|| IngestError::InvalidContext {
                name: field.name.clone(),
                value: raw.to_string(),
            })?;
            Ok((field.name.clone(), value))
        })
        .collect()
}

/// Normalize every row of `grid` according to `profile`.
#[instrument(skip(grid, profile, context), fields(document_type = %profile.document_type))]
pub fn normalize(
    grid: &ParsedGrid,
    profile: &DocumentProfile,
    context: &[(String, FieldValue)],
) -> IngestResult<NormalizedBatch> {
    let rows = grid.rows();
    let rows = if profile.drop_trailing_row {
        &rows[..rows.len().saturating_sub(1)]
    } else {
        rows
    };

    let selected = select_fields(grid, profile, rows)?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        // header is row 1
        let row_number = i + 2;
        let mut fields = Vec::with_capacity(selected.len() + context.len());
        for field in &selected {
            let value = field.coerce(row, row_number)?;
            fields.push((field.spec.name.clone(), value));
        }
        fields.extend(context.iter().cloned());
        records.push(NormalizedRecord::new(fields));
    }

    debug!(records = records.len(), "Batch normalized");

    Ok(NormalizedBatch {
        document_type: profile.document_type.clone(),
        columns: selected.iter().map(|field| field.spec.name.clone()).collect(),
        context: context.to_vec(),
        records,
    })
}

/// A field spec bound to the grid columns it reads from
struct SelectedField {
    spec: FieldSpec,
    index: usize,
    /// Month and year columns completing a bare day-of-month
    date_parts: Option<(usize, usize)>,
    /// Numeric cells keep their type instead of turning into text
    keep_numbers: bool,
}

impl SelectedField {
    fn coerce(&self, row: &[CellValue], row_number: usize) -> IngestResult<FieldValue> {
        let cell = &row[self.index];
        match (self.keep_numbers, cell) {
            (true, CellValue::Number(n)) => number_value(*n)
                .ok_or_else(|| type_error(&self.spec, row_number, cell, "number")),
            _ => match self.date_parts {
                Some((month, year)) => {
                    coerce_day_of_month(cell, &row[month], &row[year], &self.spec, row_number)
                },
                None => coerce_cell(cell, &self.spec, row_number),
            },
        }
    }
}

fn select_fields(
    grid: &ParsedGrid,
    profile: &DocumentProfile,
    rows: &[Vec<CellValue>],
) -> IngestResult<Vec<SelectedField>> {
    let column = |name: &str| {
        grid.column_index(name)
            .ok_or_else(|| IngestError::Schema(format!("missing column '{}'", name)))
    };

    match &profile.columns {
        ColumnLayout::Fixed { fields, .. } => fields
            .iter()
            .map(|spec| {
                let date_parts = spec
                    .date_parts
                    .as_ref()
                    .map(|parts| Ok::<_, IngestError>((column(&parts.month)?, column(&parts.year)?)))
                    .transpose()?;
                Ok(SelectedField {
                    spec: spec.clone(),
                    index: column(&spec.source)?,
                    date_parts,
                    keep_numbers: false,
                })
            })
            .collect(),
        ColumnLayout::Open => Ok(grid
            .header()
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let kind = infer_open_kind(rows, index);
                SelectedField {
                    spec: FieldSpec::new(name, kind).required(),
                    index,
                    date_parts: None,
                    keep_numbers: kind == FieldKind::Text,
                }
            })
            .collect()),
    }
}

/// Type of an open-layout column: numeric when every cell is a number
/// (integer when all are whole), text otherwise.
fn infer_open_kind(rows: &[Vec<CellValue>], index: usize) -> FieldKind {
    let mut whole = true;
    for row in rows {
        let n = match &row[index] {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => n,
                Err(_) => return FieldKind::Text,
            },
            _ => return FieldKind::Text,
        };
        if !n.is_finite() {
            return FieldKind::Text;
        }
        whole &= integral(n).is_some();
    }
    if rows.is_empty() {
        FieldKind::Text
    } else if whole {
        FieldKind::Integer
    } else {
        FieldKind::Float
    }
}

fn number_value(n: f64) -> Option<FieldValue> {
    if !n.is_finite() {
        return None;
    }
    Some(integral(n).map_or(FieldValue::Float(n), FieldValue::Integer))
}

fn type_error(spec: &FieldSpec, row: usize, cell: &CellValue, expected: &'static str) -> IngestError {
    IngestError::Type {
        column: spec.source.clone(),
        row,
        value: cell.to_string(),
        expected,
    }
}

fn coerce_cell(cell: &CellValue, spec: &FieldSpec, row: usize) -> IngestResult<FieldValue> {
    if cell.is_empty() {
        return if spec.required {
            Err(type_error(spec, row, cell, "non-empty value"))
        } else {
            Ok(FieldValue::Null)
        };
    }

    let value = match (spec.kind, cell) {
        (FieldKind::Text, _) => Some(FieldValue::Text(cell.to_string().trim().to_string())),
        (FieldKind::Float, CellValue::Number(n)) => n.is_finite().then_some(FieldValue::Float(*n)),
        (FieldKind::Integer, CellValue::Number(n)) => integral(*n).map(FieldValue::Integer),
        (FieldKind::Date, CellValue::DateTime(dt)) => Some(FieldValue::Date(dt.date())),
        (kind, CellValue::Text(s)) => coerce_text(s.trim(), kind),
        _ => None,
    };

    value.ok_or_else(|| type_error(spec, row, cell, spec.kind.label()))
}

/// A full date in the day column wins; a bare day number is completed from
/// the month and year cells.
fn coerce_day_of_month(
    day: &CellValue,
    month: &CellValue,
    year: &CellValue,
    spec: &FieldSpec,
    row: usize,
) -> IngestResult<FieldValue> {
    coerce_cell(day, spec, row).or_else(|err| {
        assemble_date(day, month, year)
            .map(FieldValue::Date)
            .ok_or(err)
    })
}

fn assemble_date(day: &CellValue, month: &CellValue, year: &CellValue) -> Option<NaiveDate> {
    let day = whole_number(day).and_then(|d| u32::try_from(d).ok())?;
    let month = month_number(month)?;
    let year = whole_number(year).and_then(|y| i32::try_from(y).ok())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn whole_number(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Number(n) => integral(*n),
        CellValue::Text(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Month as a number 1-12 or a Russian month name in any case or grammatical
/// form ("Февраль", "февраля", "фев")
fn month_number(cell: &CellValue) -> Option<u32> {
    if let Some(n) = whole_number(cell) {
        return u32::try_from(n).ok().filter(|m| (1..=12).contains(m));
    }
    let CellValue::Text(s) = cell else {
        return None;
    };
    let name = s.trim().to_lowercase();
    MONTH_PREFIXES
        .iter()
        .position(|prefix| name.starts_with(prefix))
        .map(|i| i as u32 + 1)
}

/// "мар" is checked before "ма" so March and May do not collide
const MONTH_PREFIXES: [&str; 12] = [
    "янв", "фев", "мар", "апр", "ма", "июн", "июл", "авг", "сен", "окт", "ноя", "дек",
];

/// Parse a text value as `kind`. `None` when it does not fit.
fn coerce_text(raw: &str, kind: FieldKind) -> Option<FieldValue> {
    match kind {
        FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
        FieldKind::Float => parse_decimal(raw).map(FieldValue::Float),
        FieldKind::Integer => raw
            .parse::<i64>()
            .ok()
            .or_else(|| parse_decimal(raw).and_then(integral))
            .map(FieldValue::Integer),
        FieldKind::Date => parse_date(raw).map(FieldValue::Date),
    }
}

/// Finite decimal, accepting a comma as the decimal separator.
///
/// Russian-locale exports write "10,5"; a plain float parse would reject
/// those files outright.
fn parse_decimal(raw: &str) -> Option<f64> {
    let parsed = match raw.parse::<f64>() {
        Ok(n) => n,
        Err(_) if raw.matches(',').count() == 1 && !raw.contains('.') => {
            raw.replace(',', ".").parse::<f64>().ok()?
        },
        Err(_) => return None,
    };
    parsed.is_finite().then_some(parsed)
}

fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER).then_some(n as i64)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|fmt| {
                chrono::NaiveDateTime::parse_from_str(raw, fmt)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
}

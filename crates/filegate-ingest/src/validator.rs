//! Header contract checks

use crate::error::{IngestError, IngestResult};
use crate::grid::ParsedGrid;
use crate::profile::{ColumnLayout, DocumentProfile};
use std::collections::HashSet;
use tracing::warn;

/// Check the grid header against the profile's contract.
///
/// Fixed layouts require exact element-wise equality with the expected
/// columns, order included. Open layouts accept any header with no blank
/// and no repeated names.
pub fn validate(grid: &ParsedGrid, profile: &DocumentProfile) -> IngestResult<()> {
    let result = match &profile.columns {
        ColumnLayout::Fixed { expected, .. } => check_exact(grid.header(), expected),
        ColumnLayout::Open => check_open(grid.header()),
    };

    if let Err(ref e) = result {
        warn!(document_type = %profile.document_type, error = %e, "Bad file structure");
    }
    result
}

fn check_exact(header: &[String], expected: &[String]) -> IngestResult<()> {
    if header == expected {
        Ok(())
    } else {
        Err(IngestError::schema(expected, header))
    }
}

fn check_open(header: &[String]) -> IngestResult<()> {
    if header.is_empty() {
        return Err(IngestError::Schema("file has no columns".to_string()));
    }
    if let Some(pos) = header.iter().position(|h| h.trim().is_empty()) {
        return Err(IngestError::Schema(format!("column {} has no name", pos + 1)));
    }
    let mut seen = HashSet::new();
    for name in header {
        if !seen.insert(name.as_str()) {
            return Err(IngestError::Schema(format!("duplicate column '{}'", name)));
        }
    }
    Ok(())
}

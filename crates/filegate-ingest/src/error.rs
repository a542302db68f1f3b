//! Error types for the ingestion stages

use thiserror::Error;

/// Result type alias for ingestion stages
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Failures of parse / validate / normalize.
///
/// Every variant describes a problem with the caller's input, so the whole
/// upload is rejected and nothing reaches a sink.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// The bytes cannot be read as the format implied by the filename
    #[error("Unreadable file: {0}")]
    Parse(String),

    /// Header does not match the document type's contract
    #[error("Bad file structure: {0}")]
    Schema(String),

    /// A cell failed coercion to its field type
    #[error("Bad file structure: column '{column}' row {row}: {value:?} is not a valid {expected}")]
    Type {
        column: String,
        /// Spreadsheet row number, the header being row 1
        row: usize,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown document type '{0}'")]
    UnknownDocumentType(String),

    #[error("Invalid request: missing required parameter {0}")]
    MissingContext(String),

    #[error("Invalid request: parameter {name} has invalid value {value:?}")]
    InvalidContext { name: String, value: String },
}

impl IngestError {
    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Parse(_) => "PARSE_ERROR",
            IngestError::Schema(_) => "SCHEMA_ERROR",
            IngestError::Type { .. } => "TYPE_ERROR",
            IngestError::UnknownDocumentType(_) => "UNKNOWN_DOCUMENT_TYPE",
            IngestError::MissingContext(_) | IngestError::InvalidContext { .. } => {
                "VALIDATION_ERROR"
            },
        }
    }

    pub(crate) fn schema(expected: &[String], found: &[String]) -> Self {
        IngestError::Schema(format!("expected columns {:?}, found {:?}", expected, found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_message() {
        let err = IngestError::schema(
            &["offer_id".to_string(), "price".to_string()],
            &["offer_id".to_string(), "cost".to_string()],
        );
        let message = err.to_string();
        assert!(message.starts_with("Bad file structure"));
        assert!(message.contains("\"cost\""));
        assert_eq!(err.code(), "SCHEMA_ERROR");
    }

    #[test]
    fn test_type_message() {
        let err = IngestError::Type {
            column: "price".to_string(),
            row: 3,
            value: "abc".to_string(),
            expected: "number",
        };
        assert_eq!(
            err.to_string(),
            "Bad file structure: column 'price' row 3: \"abc\" is not a valid number"
        );
        assert_eq!(err.code(), "TYPE_ERROR");
    }
}

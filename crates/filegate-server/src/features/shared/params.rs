//! Query-string parameter parsing
//!
//! Handlers take parameters as `Option<String>` and parse them here so that a
//! bad value produces our own `VALIDATION_ERROR` body instead of axum's plain
//! text rejection.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Invalid request: missing required parameter {0}")]
    Missing(&'static str),

    #[error("Invalid request: parameter {name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Parse an optional `client_id`; blank counts as absent
pub fn parse_client_id(raw: Option<&str>) -> Result<Option<i64>, ParamError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<i64>().map(Some).map_err(|_| ParamError::Invalid {
            name: "client_id",
            value: v.to_string(),
        }),
    }
}

/// Parse an optional positive row limit
pub fn parse_limit(raw: Option<&str>, default: usize) -> Result<usize, ParamError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ParamError::Invalid {
                name: "limit",
                value: v.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_id() {
        assert_eq!(parse_client_id(None), Ok(None));
        assert_eq!(parse_client_id(Some("  ")), Ok(None));
        assert_eq!(parse_client_id(Some("42")), Ok(Some(42)));
        assert!(matches!(
            parse_client_id(Some("abc")),
            Err(ParamError::Invalid { name: "client_id", .. })
        ));
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None, 50), Ok(50));
        assert_eq!(parse_limit(Some("5"), 50), Ok(5));
        assert!(parse_limit(Some("0"), 50).is_err());
    }
}

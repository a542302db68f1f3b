//! Shared utilities for feature modules
//!
//! - **error_helpers**: Database error classification
//! - **params**: Query-string parameter parsing

pub mod error_helpers;
pub mod params;

pub use error_helpers::is_unique_violation;
pub use params::{parse_client_id, parse_limit, ParamError};

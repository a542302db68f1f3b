//! Filegate Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the Filegate workspace members.
//!
//! - **Logging**: one place to configure `tracing` output for every binary
//! - **Filenames**: upload filename sanitizing, extension checks and
//!   collision-free renaming
//! - **Checksums**: content digests recorded alongside stored files
//!
//! # Example
//!
//! ```no_run
//! use filegate_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod filename;
pub mod logging;

pub use checksum::sha256_hex;

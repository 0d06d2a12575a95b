//! Shared utilities for `roster_import`.
//!
//! - ID generation (base36 adaptive)
//! - Date and timestamp parsing

pub mod id;
pub mod time;

pub use id::{IdConfig, IdGenerator};
pub use time::{parse_row_date, parse_timestamp};

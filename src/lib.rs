//! `roster_import` - bulk employee and SIM card import with a self-extending
//! reference catalog.
//!
//! Rows are validated and resolved against the reference catalog, missing
//! catalog entries are created in one batch, and the surviving rows are
//! committed in ordered phases. Row-level problems are reported per row and
//! never abort the batch; storage failures abort it with the phase tagged.

pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod model;
pub mod storage;
pub mod util;

pub use error::{ErrorCode, ImportPhase, Result, RosterError, StructuredError};
pub use import::{
    ImportOptions, ImportResult, Importer, RowError, import_employees, import_sim_cards,
};

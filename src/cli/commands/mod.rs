//! Command implementations.

pub mod catalog;
pub mod import;
pub mod init;
pub mod list;

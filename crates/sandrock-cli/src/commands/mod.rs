//! CLI command implementations.
//!
//! Each command returns the run report it produced, if any; printing and
//! saving the report is left to the caller.

pub mod export;
pub mod hex_utils;
pub mod inspect;
pub mod patch;
pub mod summary;
pub mod translate;

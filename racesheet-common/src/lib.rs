//! # Racesheet Common Library
//!
//! Shared code for the racesheet tools including:
//! - Error and result types
//! - A1 cell/range addressing
//! - TOML configuration model and file resolution
//! - Local-time helpers

pub mod a1;
pub mod config;
pub mod error;
pub mod time;

pub use a1::{CellRef, RangeRef};
pub use error::{Error, Result};

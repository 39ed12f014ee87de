//! racesheet-ingest library interface
//!
//! Reconciles race results extracted from leaderboard screenshots into the
//! league results workbook.
//!
//! - [`layout`]: cell arithmetic of the results sheet
//! - [`reconcile`]: time parsing, delta checks, name resolution, block
//!   assignment, fastest lap, and the engine that stages a record
//! - [`services`]: quota gate, extraction seam, ingest pipeline, recheck and
//!   summary read-backs, screenshot ordering
//! - [`store`]: worksheet store seam and the in-memory workbook

pub mod error;
pub mod layout;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod store;

pub use crate::error::{IngestError, IngestResult};
pub use crate::models::{DriverResult, HeatLabel, RaceResultRecord};
pub use crate::reconcile::{ReconcileOutcome, ReconciliationEngine, ReferenceTables, Warning};
pub use crate::services::{IngestPipeline, ProcessedImage};
pub use crate::store::{CellValue, Highlight, MemoryStore, SheetStore};

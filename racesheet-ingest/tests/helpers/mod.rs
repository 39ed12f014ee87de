//! Test helper utilities
//!
//! Shared utilities for racesheet-ingest integration tests

pub mod failing_store;
pub mod log_capture;
pub mod scripted_client;
pub mod workbook;

#[allow(unused_imports)]
pub use failing_store::FailingStore;
#[allow(unused_imports)]
pub use log_capture::{capture_logs, LogCapture};
#[allow(unused_imports)]
pub use scripted_client::{screenshot, ScriptedClient};
#[allow(unused_imports)]
pub use workbook::{native_response, record, seeded_store, Row};

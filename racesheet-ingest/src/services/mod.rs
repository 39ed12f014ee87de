//! Services around the reconciliation core
//!
//! - `quota`: upstream rate-limit gate
//! - `extraction`: vision service seam and response parsing
//! - `pipeline`: per-screenshot sequencing
//! - `recheck` / `summary`: read-back operations on a written race
//! - `ordering`: screenshot reading order and markers

pub mod extraction;
pub mod ordering;
pub mod pipeline;
pub mod quota;
pub mod recheck;
pub mod summary;

pub use extraction::{
    parse_extraction_response, ExtractionClient, ExtractionFailure, ImagePayload, Instruction,
};
pub use ordering::{markers_for, meta_from_markers, order_key, sort_screenshots, ScreenshotMeta};
pub use pipeline::{extraction_diffs, FieldDiff, IngestPipeline, ProcessedImage};
pub use quota::{next_daily_reset, QuotaKind, QuotaScheduler, QuotaState};
pub use recheck::{recheck_race, RecheckReport};
pub use summary::{race_summary, RaceSummary};

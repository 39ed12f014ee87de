//! Error types for racesheet-ingest
//!
//! Only quota and extraction failures abort a record. Name, time, delta and
//! heat-label problems are reported as [`crate::reconcile::Warning`] values
//! alongside a committed write.

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::services::quota::QuotaKind;

/// Ingest error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upstream rejected the call for quota reasons; scheduler now blocked
    #[error("Extraction quota exceeded ({kind}), blocked until {until}")]
    QuotaExceeded {
        kind: QuotaKind,
        until: DateTime<Local>,
    },

    /// Gate refused the attempt; no upstream call was made
    #[error("Extraction blocked ({kind}) until {until}")]
    QuotaBlocked {
        kind: QuotaKind,
        until: DateTime<Local>,
    },

    /// Upstream returned data that does not match the record shape
    #[error("Malformed extraction result: {0}")]
    ExtractionMalformed(String),

    /// Any other upstream failure
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Store read/write failure
    #[error("Store error: {0}")]
    Store(String),

    /// racesheet-common error
    #[error("Common error: {0}")]
    Common(#[from] racesheet_common::Error),
}

impl IngestError {
    /// Whether this error came from the quota gate (retry later)
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::QuotaBlocked { .. })
    }

    /// Blocked-until time for quota errors
    pub fn retry_at(&self) -> Option<DateTime<Local>> {
        match self {
            Self::QuotaExceeded { until, .. } | Self::QuotaBlocked { until, .. } => Some(*until),
            _ => None,
        }
    }
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

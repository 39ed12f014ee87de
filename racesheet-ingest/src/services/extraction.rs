//! Extraction service seam
//!
//! The vision model reading leaderboard screenshots is a black box: it takes
//! an image and an instruction and answers with JSON text, or fails. Quota
//! failures are classified so the gate can pick the right backoff.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::quota::QuotaKind;
use crate::error::{IngestError, IngestResult};
use crate::models::RaceResultRecord;

static CODE_FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z]*\s*").expect("static regex"));
static CODE_FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").expect("static regex"));

/// Screenshot handed to the extraction service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Source name, for logs only
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// What the service is asked to do with the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// First pass: read the leaderboard
    Extract,
    /// Second pass: compare a prior result with the image, correct only errors
    Verify { previous: String },
}

impl Instruction {
    /// Instruction payload sent alongside the image
    pub fn prompt(&self) -> String {
        match self {
            Self::Extract => EXTRACT_PROMPT.to_string(),
            Self::Verify { previous } => format!(
                "I extracted the following data from this Gran Turismo results screen:\n\n\
                 {}\n\n\
                 Compare it carefully with the image and return corrected JSON.\n\
                 Return ONLY valid JSON, no Markdown.\n\n\
                 Rules:\n\
                 - Change ONLY what is clearly wrong\n\
                 - NEVER correct driver names\n\
                 - If everything is correct, return exactly the same data\n",
                previous
            ),
        }
    }
}

const EXTRACT_PROMPT: &str = "\
Analyse this Gran Turismo results screen and extract the data as JSON.

Return ONLY valid JSON, no Markdown, no explanations.

DRIVER NAMES: copy exactly as shown in the image. No corrections.
CAR NAMES: copy exactly as shown, including year, special characters and brackets.

Format:
{
  \"rennen\": <number>,
  \"grid\": \"<1, 2, 2a, 2b or 3>\",
  \"fahrer\": [
    {
      \"position\": <number>,
      \"name\": \"<exactly as shown>\",
      \"auto\": \"<exactly as shown>\",
      \"zeit\": \"<exactly as shown>\",
      \"beste_runde\": \"<e.g. 8:27,088 or empty>\"
    }
  ]
}

Notes:
- race number and grid are in the title
- the winner has an absolute race time (e.g. 50:28,752)
- everyone else has a delta (e.g. +06,425)
- lapped drivers: 'X Runden' or 'X Laps'
- DNF: 'DNF' or '--:--,---'
- beste_runde comes from the BEST LAP column on the far right
";

/// Failed extraction call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("Quota exceeded ({0})")]
    Quota(QuotaKind),

    #[error("{0}")]
    Other(String),
}

impl ExtractionFailure {
    /// Quota failure classified from the upstream message
    pub fn quota(message: &str) -> Self {
        Self::Quota(QuotaKind::classify(message))
    }
}

/// Vision extraction service
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Raw response text for one image
    async fn extract(
        &self,
        image: &ImagePayload,
        instruction: &Instruction,
    ) -> Result<String, ExtractionFailure>;
}

/// Strip Markdown code fences around a JSON answer
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let start = CODE_FENCE_OPEN.find(trimmed).map_or(0, |m| m.end());
    let rest = &trimmed[start..];
    let end = CODE_FENCE_CLOSE.find(rest).map_or(rest.len(), |m| m.start());
    &rest[..end]
}

/// Parse and structurally validate an extraction answer
pub fn parse_extraction_response(text: &str) -> IngestResult<RaceResultRecord> {
    let body = strip_code_fences(text);
    let record: RaceResultRecord = serde_json::from_str(body)
        .map_err(|e| IngestError::ExtractionMalformed(format!("invalid JSON: {}", e)))?;
    record.validate()?;
    Ok(record)
}

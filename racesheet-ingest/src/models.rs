//! Extracted race-result records
//!
//! The extraction service answers with its own (German) key names; both those
//! and the English names are accepted on input. Heat labels and positions may
//! arrive as JSON strings or numbers.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{IngestError, IngestResult};
use crate::layout::POSITIONS_PER_BLOCK;

/// Heat ("grid") label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeatLabel {
    One,
    Two,
    TwoA,
    TwoB,
    Three,
    /// Anything outside the fixed vocabulary (kept lower-cased)
    Other(String),
}

impl HeatLabel {
    /// Case-insensitive, whitespace-tolerant parse
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" => Self::One,
            "2" => Self::Two,
            "2a" => Self::TwoA,
            "2b" => Self::TwoB,
            "3" => Self::Three,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::TwoA => "2a",
            Self::TwoB => "2b",
            Self::Three => "3",
            Self::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for HeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finishing position as read from a leaderboard screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverResult {
    #[serde(deserialize_with = "u32_lenient")]
    pub position: u32,
    /// Raw driver name, case preserved
    #[serde(alias = "name", deserialize_with = "string_or_number")]
    pub driver: String,
    /// Raw car name
    #[serde(default, alias = "auto", deserialize_with = "string_or_number")]
    pub car: String,
    /// Raw time token: absolute time, delta, "DNF", lap deficit, or empty
    #[serde(default, alias = "zeit", deserialize_with = "string_or_number")]
    pub time: String,
    /// Raw best-lap token, may be empty
    #[serde(default, alias = "beste_runde", deserialize_with = "string_or_number")]
    pub best_lap: String,
}

/// One extraction result: a single heat (or page of a heat) of one race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceResultRecord {
    /// Race number as printed in the screenshot (0 = not read)
    #[serde(default, alias = "rennen", deserialize_with = "u32_lenient")]
    pub race: u32,
    /// Heat label as printed (trimmed on validation)
    #[serde(alias = "grid", deserialize_with = "string_or_number")]
    pub heat: String,
    #[serde(alias = "fahrer")]
    pub drivers: Vec<DriverResult>,
}

impl RaceResultRecord {
    pub fn heat_label(&self) -> HeatLabel {
        HeatLabel::parse(&self.heat)
    }

    /// Drivers ordered by ascending position
    pub fn sorted_drivers(&self) -> Vec<&DriverResult> {
        let mut drivers: Vec<&DriverResult> = self.drivers.iter().collect();
        drivers.sort_by_key(|d| d.position);
        drivers
    }

    /// Lowest position present (decides page 1 vs page 2)
    pub fn first_position(&self) -> Option<u32> {
        self.drivers.iter().map(|d| d.position).min()
    }

    /// Structural checks: heat present, positions unique and inside one block
    pub fn validate(&self) -> IngestResult<()> {
        if self.heat.trim().is_empty() {
            return Err(IngestError::ExtractionMalformed(
                "heat label missing".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for d in &self.drivers {
            if d.position == 0 || d.position > POSITIONS_PER_BLOCK {
                return Err(IngestError::ExtractionMalformed(format!(
                    "position {} outside 1..={}",
                    d.position, POSITIONS_PER_BLOCK
                )));
            }
            if !seen.insert(d.position) {
                return Err(IngestError::ExtractionMalformed(format!(
                    "duplicate position {}",
                    d.position
                )));
            }
        }
        Ok(())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn u32_lenient<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| D::Error::custom(format!("not a non-negative integer: {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("not a non-negative integer: '{}'", s))),
        serde_json::Value::Null => Ok(0),
        other => Err(D::Error::custom(format!("expected integer, got {}", other))),
    }
}

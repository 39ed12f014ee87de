//! Non-fatal reconciliation findings
//!
//! A record carrying warnings is still committed; warnings are additive and
//! handed to the presentation layer as-is.

use std::fmt;

/// Human-readable, non-fatal finding about one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Driver not in the driver table nor its alias column
    DriverUnresolved {
        race: u32,
        heat: String,
        position: u32,
        raw: String,
        suggestion: Option<String>,
    },
    /// Car neither translated nor canonical
    CarUnresolved {
        race: u32,
        heat: String,
        position: u32,
        driver: String,
        car: String,
        suggestion: Option<String>,
    },
    /// Delta does not increase over the previous position
    DeltaViolation {
        heat: String,
        position: u32,
        driver: String,
    },
    /// Lapped driver: time cell left empty for manual entry
    ManualTimeEntry {
        heat: String,
        position: u32,
        driver: String,
        laps: u32,
    },
    /// Time too large to store as a number; cell left empty
    TimeOutOfRange {
        heat: String,
        position: u32,
        driver: String,
        raw: String,
    },
    /// Heat label outside the known vocabulary
    BlockLabelUnknown { race: u32, label: String, block: u32 },
    /// Race number read from the screenshot differs from the race written to
    RaceNumberMismatch {
        screenshot_race: u32,
        used_race: u32,
        heat: String,
        page: u32,
    },
}

impl Warning {
    /// Position the warning refers to, if any
    pub fn position(&self) -> Option<u32> {
        match self {
            Self::DriverUnresolved { position, .. }
            | Self::CarUnresolved { position, .. }
            | Self::DeltaViolation { position, .. }
            | Self::ManualTimeEntry { position, .. }
            | Self::TimeOutOfRange { position, .. } => Some(*position),
            Self::BlockLabelUnknown { .. } | Self::RaceNumberMismatch { .. } => None,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriverUnresolved {
                race,
                heat,
                position,
                raw,
                suggestion,
            } => {
                write!(
                    f,
                    "Race {}, grid {}, pos {}, {}: driver not in driver list",
                    race, heat, position, raw
                )?;
                if let Some(s) = suggestion {
                    write!(f, " (did you mean '{}'?)", s)?;
                }
                Ok(())
            }
            Self::CarUnresolved {
                race,
                heat,
                position,
                driver,
                car,
                suggestion,
            } => {
                write!(
                    f,
                    "Race {}, grid {}, pos {}, {}: car '{}' not recognised, please check manually",
                    race, heat, position, driver, car
                )?;
                if let Some(s) = suggestion {
                    write!(f, " (did you mean '{}'?)", s)?;
                }
                Ok(())
            }
            Self::DeltaViolation {
                heat,
                position,
                driver,
            } => write!(f, "Grid {}, pos {}, {}: time needs checking", heat, position, driver),
            Self::ManualTimeEntry {
                heat,
                position,
                driver,
                laps,
            } => write!(
                f,
                "Grid {}, pos {}, {}: {} lap(s) down, time must be entered manually",
                heat, position, driver, laps
            ),
            Self::TimeOutOfRange {
                heat,
                position,
                driver,
                raw,
            } => write!(
                f,
                "Grid {}, pos {}, {}: time '{}' out of range, must be entered manually",
                heat, position, driver, raw
            ),
            Self::BlockLabelUnknown { race, label, block } => write!(
                f,
                "Race {}: unknown grid label '{}', written to block {}",
                race, label, block
            ),
            Self::RaceNumberMismatch {
                screenshot_race,
                used_race,
                heat,
                page,
            } => write!(
                f,
                "Screenshot shows race {} but race {} is current; written to race {} (grid {}, page {})",
                screenshot_race, used_race, used_race, heat, page
            ),
        }
    }
}

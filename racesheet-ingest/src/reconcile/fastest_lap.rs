//! Per-race fastest-lap record
//!
//! The stored record lives in the race's fastest-lap cells and is read fresh
//! before each record is reconciled. Candidates replace it only on strict
//! improvement; ties keep the earlier holder.

use tracing::info;

use super::time_token::digits_value;
use crate::error::IngestResult;
use crate::layout::fastest_lap_cells;
use crate::store::{CellValue, SheetStore};
use racesheet_common::CellRef;

/// Fastest lap holder and digit-normalized lap value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastestLap {
    pub driver: String,
    pub time: u64,
}

/// Running best lap of one race
#[derive(Debug, Clone, Default)]
pub struct FastestLapTracker {
    best: Option<FastestLap>,
    improved: bool,
}

impl FastestLapTracker {
    /// Start from a known record (or none)
    pub fn new(current: Option<FastestLap>) -> Self {
        Self {
            best: current,
            improved: false,
        }
    }

    /// Start from the record stored for `race`
    ///
    /// A time cell without digits counts as no record.
    pub async fn from_store(store: &dyn SheetStore, sheet: &str, race: u32) -> IngestResult<Self> {
        let (driver_cell, time_cell) = fastest_lap_cells(race);
        let time = store.read_cell(sheet, time_cell).await?;
        let current = match digits_value(&time.display()) {
            Some(time) => {
                let driver = store.read_cell(sheet, driver_cell).await?;
                Some(FastestLap {
                    driver: driver.display(),
                    time,
                })
            }
            None => None,
        };
        Ok(Self::new(current))
    }

    /// Offer a driver's raw best-lap token; returns true if it took the record
    ///
    /// The token is read purely as a time (digit concatenation), never as a
    /// lap deficit. Tokens without digits, or too large to store, are ignored.
    pub fn offer(&mut self, driver: &str, raw_best_lap: &str) -> bool {
        let storable = digits_value(raw_best_lap).filter(|v| i64::try_from(*v).is_ok());
        let Some(candidate) = storable else {
            return false;
        };
        let better = self.best.as_ref().map_or(true, |b| candidate < b.time);
        if better {
            self.best = Some(FastestLap {
                driver: driver.to_string(),
                time: candidate,
            });
            self.improved = true;
        }
        better
    }

    pub fn best(&self) -> Option<&FastestLap> {
        self.best.as_ref()
    }

    /// Driver/time writes for `race` if any offer improved the record
    pub fn pending_writes(&self, race: u32) -> Option<[(CellRef, CellValue); 2]> {
        if !self.improved {
            return None;
        }
        let best = self.best.as_ref()?;
        info!(race, driver = %best.driver, time = best.time, "New fastest lap");
        let (driver_cell, time_cell) = fastest_lap_cells(race);
        Some([
            (driver_cell, CellValue::text(best.driver.clone())),
            (time_cell, CellValue::number_or_empty(Some(best.time))),
        ])
    }
}

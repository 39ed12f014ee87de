//! Race summary read back from the results sheet

use racesheet_common::CellRef;
use tracing::debug;

use crate::error::IngestResult;
use crate::layout::{cell, check_race, column_start, fastest_lap_cells, grid_label_cell, Field, BLOCK_COUNT};
use crate::store::SheetStore;

/// Row holding the race date and track
const HEADER_ROW: u32 = 3;
const DATE_OFFSET: u32 = 2;
const TRACK_OFFSET: u32 = 3;
/// Row holding the driver-count text
const DRIVER_COUNT_ROW: u32 = 4;

/// Sheet placeholders that mean "not filled in"
const PLACEHOLDERS: [&str; 3] = ["", "n/a", "strecke in db_tech definieren!"];

/// Winner of one heat block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatWinner {
    pub heat: String,
    pub driver: String,
}

/// Summary of one race
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaceSummary {
    pub race: u32,
    pub date: Option<String>,
    pub track: Option<String>,
    pub drivers: Option<String>,
    pub winners: Vec<HeatWinner>,
    /// (time, driver) as displayed
    pub fastest_lap: Option<(String, String)>,
}

impl RaceSummary {
    /// Plain-text rendering, title first
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![match &self.track {
            Some(track) => format!("Race {:02} - {}", self.race, track),
            None => format!("Race {:02}", self.race),
        }];
        if let Some(date) = &self.date {
            lines.push(date.clone());
        }
        if let Some(drivers) = &self.drivers {
            lines.push(format!("Drivers: {}", drivers));
        }
        if !self.winners.is_empty() {
            lines.push(String::new());
            lines.push("Grid winners 🏆".to_string());
            for w in &self.winners {
                lines.push(format!("Grid {}: {}", w.heat, w.driver));
            }
        }
        if let Some((time, driver)) = &self.fastest_lap {
            lines.push(format!("FL: {} - {}", time, driver));
        }
        lines
    }
}

fn meaningful(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn read_text(store: &dyn SheetStore, sheet: &str, cell: CellRef) -> IngestResult<String> {
    Ok(store.read_cell(sheet, cell).await?.display().trim().to_string())
}

/// Read the summary of `race`
pub async fn race_summary(
    store: &dyn SheetStore,
    sheet: &str,
    race: u32,
) -> IngestResult<RaceSummary> {
    check_race(race)?;
    let col = column_start(race);
    let date = read_text(store, sheet, CellRef::new(HEADER_ROW, col + DATE_OFFSET)).await?;
    let track = read_text(store, sheet, CellRef::new(HEADER_ROW, col + TRACK_OFFSET)).await?;
    let drivers = read_text(store, sheet, CellRef::new(DRIVER_COUNT_ROW, col)).await?;

    let mut winners = Vec::new();
    for block in 0..BLOCK_COUNT {
        let heat = read_text(store, sheet, grid_label_cell(race, block)).await?;
        if heat.is_empty() {
            continue;
        }
        let driver = read_text(store, sheet, cell(race, block, 1, Field::Driver)).await?;
        if !driver.is_empty() {
            winners.push(HeatWinner { heat, driver });
        }
    }

    let (fl_driver_cell, fl_time_cell) = fastest_lap_cells(race);
    let fl_driver = read_text(store, sheet, fl_driver_cell).await?;
    let fl_time = read_text(store, sheet, fl_time_cell).await?;
    let fastest_lap = if fl_driver.is_empty() {
        None
    } else {
        Some((fl_time, fl_driver))
    };

    debug!(race, winners = winners.len(), "Race summary read");
    Ok(RaceSummary {
        race,
        date: meaningful(date),
        track: meaningful(track),
        drivers: meaningful(drivers),
        winners,
        fastest_lap,
    })
}

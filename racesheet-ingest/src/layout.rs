//! Results-sheet layout
//!
//! Fixed arithmetic from logical coordinates (race, block, position, field)
//! to physical cells. These constants are the on-sheet contract shared with
//! every existing workbook and are not configurable.
//!
//! ```text
//!            col B (race 1)            col P (race 2)
//! row 3      .. .. .. .. FL-drv FL-time ..
//! row 5      grid pos drv team car time laps   <- block 0, position 1
//! ...
//! row 25     grid pos drv team car time laps   <- block 1, position 1
//! ```

use racesheet_common::CellRef;

use crate::error::{IngestError, IngestResult};

/// Column of race 1 (B)
pub const FIRST_COL: u32 = 2;
/// First row of block 0
pub const FIRST_ROW: u32 = 5;
/// Columns per race
pub const COL_STRIDE: u32 = 14;
/// Rows per block
pub const ROW_STRIDE: u32 = 20;
/// Row holding the fastest-lap driver/time of every race
pub const FASTEST_LAP_ROW: u32 = 3;
/// Blocks per race
pub const BLOCK_COUNT: u32 = 4;
/// Positions per block
pub const POSITIONS_PER_BLOCK: u32 = ROW_STRIDE;
/// Highest addressable race; keeps every race column inside u32 and the sheet
pub const MAX_RACE: u32 = 999;

/// Per-position field within a race's column span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    GridLabel,
    Position,
    Driver,
    Team,
    Car,
    RaceTime,
    Laps,
    /// Only meaningful on [`FASTEST_LAP_ROW`]
    FastestLapDriver,
    /// Only meaningful on [`FASTEST_LAP_ROW`]
    FastestLapTime,
}

impl Field {
    /// Fields written for every reconciled position
    pub const DATA_FIELDS: [Field; 5] = [
        Field::Driver,
        Field::Team,
        Field::Car,
        Field::RaceTime,
        Field::Laps,
    ];

    /// Fields moved when a block is relocated (team stays behind)
    pub const RELOCATED_FIELDS: [Field; 4] =
        [Field::Driver, Field::Car, Field::RaceTime, Field::Laps];

    pub fn offset(self) -> u32 {
        match self {
            Field::GridLabel => 0,
            Field::Position => 1,
            Field::Driver => 2,
            Field::Team => 3,
            Field::Car => 4,
            Field::RaceTime => 5,
            Field::Laps => 6,
            Field::FastestLapDriver => 4,
            Field::FastestLapTime => 5,
        }
    }
}

/// Reject race numbers outside `1..=MAX_RACE`
///
/// Every other function here assumes a race that passed this check.
pub fn check_race(race: u32) -> IngestResult<()> {
    if (1..=MAX_RACE).contains(&race) {
        Ok(())
    } else {
        Err(IngestError::Common(racesheet_common::Error::InvalidInput(format!(
            "race {} outside 1..={}",
            race, MAX_RACE
        ))))
    }
}

/// First column of a race
pub fn column_start(race: u32) -> u32 {
    FIRST_COL + (race - 1) * COL_STRIDE
}

/// First row of a block
pub fn row_start(block: u32) -> u32 {
    FIRST_ROW + block * ROW_STRIDE
}

/// Cell of one field of one position
pub fn cell(race: u32, block: u32, position: u32, field: Field) -> CellRef {
    CellRef::new(
        row_start(block) + position - 1,
        column_start(race) + field.offset(),
    )
}

/// Cell holding a block's heat label
pub fn grid_label_cell(race: u32, block: u32) -> CellRef {
    CellRef::new(row_start(block), column_start(race) + Field::GridLabel.offset())
}

/// Fastest-lap driver and time cells of a race
pub fn fastest_lap_cells(race: u32) -> (CellRef, CellRef) {
    let col = column_start(race);
    (
        CellRef::new(FASTEST_LAP_ROW, col + Field::FastestLapDriver.offset()),
        CellRef::new(FASTEST_LAP_ROW, col + Field::FastestLapTime.offset()),
    )
}

/// Last row of the last block
pub fn last_row() -> u32 {
    row_start(BLOCK_COUNT) - 1
}

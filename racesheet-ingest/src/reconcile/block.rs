//! Heat-to-block assignment
//!
//! Heats arrive in screenshot order, not canonical order. Blocks 0 and 1 are
//! fixed ("1" and "2"/"2a"); block 2 goes to whichever of "2b" or "3" shows up
//! first, and a late "2b" pushes an already-written "3" down into block 3.
//!
//! No assignment is cached: every call re-reads the stored label of block 2,
//! so resolution survives process restarts.

use racesheet_common::CellRef;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::IngestResult;
use crate::layout::{cell, grid_label_cell, Field, POSITIONS_PER_BLOCK};
use crate::models::HeatLabel;
use crate::store::{CellValue, SheetStore};

/// Block shared by "2b" and "3"
const CONTESTED_BLOCK: u32 = 2;
/// Where "3" goes once "2b" exists
const OVERFLOW_BLOCK: u32 = 3;

/// Outcome of resolving a heat label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockResolution {
    pub block: u32,
    /// Block 2 was moved to block 3 to make room
    pub relocated: bool,
    /// Label outside the known vocabulary; fallback block used
    pub unknown_label: bool,
}

impl BlockResolution {
    fn fixed(block: u32) -> Self {
        Self {
            block,
            relocated: false,
            unknown_label: false,
        }
    }
}

/// Stored heat label of a block, trimmed and lower-cased
pub async fn read_grid_label(
    store: &dyn SheetStore,
    sheet: &str,
    race: u32,
    block: u32,
) -> IngestResult<String> {
    let value = store.read_cell(sheet, grid_label_cell(race, block)).await?;
    Ok(value.display().trim().to_lowercase())
}

/// Resolve the physical block for a heat label
///
/// **Algorithm:**
/// - "1" → 0, "2"/"2a" → 1
/// - "3" → 3 if block 2 already holds "2b", else 2
/// - "2b" → 2, relocating block 2 to block 3 first if it holds "3"
/// - anything else → 2 (logged)
pub async fn resolve_block(
    store: &dyn SheetStore,
    sheet: &str,
    race: u32,
    label: &HeatLabel,
    pause: Duration,
) -> IngestResult<BlockResolution> {
    let resolution = match label {
        HeatLabel::One => BlockResolution::fixed(0),
        HeatLabel::Two | HeatLabel::TwoA => BlockResolution::fixed(1),
        HeatLabel::Three => {
            let stored = read_grid_label(store, sheet, race, CONTESTED_BLOCK).await?;
            if stored == HeatLabel::TwoB.as_str() {
                BlockResolution::fixed(OVERFLOW_BLOCK)
            } else {
                BlockResolution::fixed(CONTESTED_BLOCK)
            }
        }
        HeatLabel::TwoB => {
            let stored = read_grid_label(store, sheet, race, CONTESTED_BLOCK).await?;
            let relocated = stored == HeatLabel::Three.as_str();
            if relocated {
                info!(race, from = CONTESTED_BLOCK, to = OVERFLOW_BLOCK, "Grid 3 occupies block 2, relocating");
                relocate_block(store, sheet, race, CONTESTED_BLOCK, OVERFLOW_BLOCK, pause).await?;
            }
            BlockResolution {
                block: CONTESTED_BLOCK,
                relocated,
                unknown_label: false,
            }
        }
        HeatLabel::Other(raw) => {
            warn!(race, label = %raw, block = CONTESTED_BLOCK, "Unknown grid label, using fallback block");
            BlockResolution {
                block: CONTESTED_BLOCK,
                relocated: false,
                unknown_label: true,
            }
        }
    };

    debug!(race, heat = %label, block = resolution.block, "Block resolved");
    Ok(resolution)
}

/// Move a block's label and per-position fields to another block
///
/// Every cell is copied before its source is cleared, label first, then each
/// position's driver/car/racetime/laps. The team column is left in place.
pub async fn relocate_block(
    store: &dyn SheetStore,
    sheet: &str,
    race: u32,
    src_block: u32,
    dst_block: u32,
    pause: Duration,
) -> IngestResult<()> {
    move_cell(
        store,
        sheet,
        grid_label_cell(race, src_block),
        grid_label_cell(race, dst_block),
    )
    .await?;
    throttle(pause).await;

    for position in 1..=POSITIONS_PER_BLOCK {
        for field in Field::RELOCATED_FIELDS {
            move_cell(
                store,
                sheet,
                cell(race, src_block, position, field),
                cell(race, dst_block, position, field),
            )
            .await?;
        }
        throttle(pause).await;
    }

    info!(race, from = src_block, to = dst_block, "Block relocated");
    Ok(())
}

async fn move_cell(
    store: &dyn SheetStore,
    sheet: &str,
    src: CellRef,
    dst: CellRef,
) -> IngestResult<()> {
    let value = store.read_cell(sheet, src).await?;
    store.write_cell(sheet, dst, value).await?;
    store.write_cell(sheet, src, CellValue::Empty).await
}

async fn throttle(pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
}

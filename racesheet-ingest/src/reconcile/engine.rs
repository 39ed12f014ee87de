//! Record reconciliation
//!
//! Turns one extracted [`RaceResultRecord`] into a batch of cell writes plus
//! highlight directives and warnings. Nothing is written until [`commit`] is
//! called, except the block relocation that resolving a late "2b" requires.
//!
//! **Highlighting:** every written data cell of a position (driver, team, car,
//! racetime, laps) and the block's heat label are clean, unless a check fired
//! for that exact cell, in which case it is an error instead:
//! - unresolved driver → driver cell
//! - unresolved car → car cell
//! - delta violation or unstorable time → racetime cell
//!
//! [`commit`]: ReconciliationEngine::commit

use racesheet_common::CellRef;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info};

use super::block::resolve_block;
use super::delta::validate_deltas;
use super::fastest_lap::FastestLapTracker;
use super::names::ReferenceTables;
use super::time_token::parse_time;
use super::warnings::Warning;
use crate::error::{IngestError, IngestResult};
use crate::layout::{cell, check_race, grid_label_cell, Field};
use crate::models::RaceResultRecord;
use crate::store::{CellValue, Highlight, SheetStore};

/// Everything derived from one record, ready to commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub race: u32,
    /// Heat label as written (trimmed, case preserved)
    pub heat: String,
    pub block: u32,
    /// Lowest position in the record
    pub first_position: Option<u32>,
    pub writes: BTreeMap<CellRef, CellValue>,
    pub error_cells: BTreeSet<CellRef>,
    pub clean_cells: BTreeSet<CellRef>,
    pub warnings: Vec<Warning>,
    /// Positions flagged by the delta check
    pub delta_violations: BTreeSet<u32>,
    /// Whether resolving the block moved an existing block
    pub relocated: bool,
}

impl ReconcileOutcome {
    /// Page of a multi-image heat: page 1 holds P1 (an empty record counts as page 1)
    pub fn page(&self) -> u32 {
        match self.first_position {
            None | Some(1) => 1,
            Some(_) => 2,
        }
    }

    /// Highlight directives, error cells last
    pub fn highlights(&self) -> Vec<(CellRef, Highlight)> {
        self.clean_cells
            .iter()
            .map(|c| (*c, Highlight::Clean))
            .chain(self.error_cells.iter().map(|c| (*c, Highlight::Error)))
            .collect()
    }
}

/// Reconciles records against one results worksheet
pub struct ReconciliationEngine<'a> {
    store: &'a dyn SheetStore,
    tables: &'a ReferenceTables,
    sheet: &'a str,
    relocation_pause: Duration,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(store: &'a dyn SheetStore, tables: &'a ReferenceTables, sheet: &'a str) -> Self {
        Self {
            store,
            tables,
            sheet,
            relocation_pause: Duration::ZERO,
        }
    }

    /// Pause between individual cell moves while relocating a block
    pub fn with_relocation_pause(mut self, pause: Duration) -> Self {
        self.relocation_pause = pause;
        self
    }

    /// Reconcile `record` into `race`
    ///
    /// **Algorithm:**
    /// 1. Resolve the block (may relocate an existing block)
    /// 2. Per driver, by position: resolve names, parse the time, stage writes
    /// 3. Flag delta violations over the whole record
    /// 4. Offer every best lap to the race's stored fastest-lap record
    pub async fn reconcile(
        &self,
        record: &RaceResultRecord,
        race: u32,
    ) -> IngestResult<ReconcileOutcome> {
        if race == 0 {
            return Err(IngestError::ExtractionMalformed(
                "race number missing".to_string(),
            ));
        }
        check_race(race).map_err(|e| IngestError::ExtractionMalformed(e.to_string()))?;
        record.validate()?;

        let heat = record.heat.trim().to_string();
        let label = record.heat_label();
        let resolution = resolve_block(
            self.store,
            self.sheet,
            race,
            &label,
            self.relocation_pause,
        )
        .await?;
        let block = resolution.block;
        info!(race, heat = %heat, block, "Reconciling record");

        let mut outcome = ReconcileOutcome {
            race,
            heat: heat.clone(),
            block,
            first_position: record.first_position(),
            relocated: resolution.relocated,
            ..Default::default()
        };

        if resolution.unknown_label {
            outcome.warnings.push(Warning::BlockLabelUnknown {
                race,
                label: heat.clone(),
                block,
            });
        }

        let label_cell = grid_label_cell(race, block);
        outcome.writes.insert(label_cell, CellValue::text(heat.clone()));
        outcome.clean_cells.insert(label_cell);

        outcome.delta_violations = validate_deltas(&record.drivers);
        let mut fastest = FastestLapTracker::from_store(self.store, self.sheet, race).await?;

        for d in record.sorted_drivers() {
            let pos = d.position;
            let driver = self.tables.resolve_driver(&d.driver);
            let car = self.tables.resolve_car(&d.car);
            let time = parse_time(&d.time);

            debug!(
                position = pos,
                driver = %driver.name,
                car = %car.name,
                race_time = ?time.race_time,
                laps = ?time.laps,
                best_lap = %d.best_lap,
                "Staging position"
            );

            let at = |field: Field| cell(race, block, pos, field);
            outcome.writes.insert(at(Field::Driver), CellValue::text(driver.name.clone()));
            outcome.writes.insert(at(Field::Team), CellValue::text(driver.team.clone()));
            outcome.writes.insert(at(Field::Car), CellValue::text(car.name.clone()));
            let race_time = CellValue::number_or_empty(time.race_time);
            let time_unstorable = time.race_time.is_some() && race_time.is_empty();
            outcome.writes.insert(at(Field::RaceTime), race_time);
            outcome.writes.insert(
                at(Field::Laps),
                CellValue::number_or_empty(time.laps.map(u64::from)),
            );

            if !driver.resolved {
                outcome.error_cells.insert(at(Field::Driver));
                outcome.warnings.push(Warning::DriverUnresolved {
                    race,
                    heat: heat.clone(),
                    position: pos,
                    raw: d.driver.clone(),
                    suggestion: self.tables.suggest_driver(&d.driver),
                });
            }

            if !car.resolved {
                outcome.error_cells.insert(at(Field::Car));
                outcome.warnings.push(Warning::CarUnresolved {
                    race,
                    heat: heat.clone(),
                    position: pos,
                    driver: driver.name.clone(),
                    car: car.name.clone(),
                    suggestion: self.tables.suggest_car(&d.car),
                });
            }

            if outcome.delta_violations.contains(&pos) {
                outcome.error_cells.insert(at(Field::RaceTime));
                outcome.warnings.push(Warning::DeltaViolation {
                    heat: heat.clone(),
                    position: pos,
                    driver: driver.name.clone(),
                });
            }

            if time_unstorable {
                outcome.error_cells.insert(at(Field::RaceTime));
                outcome.warnings.push(Warning::TimeOutOfRange {
                    heat: heat.clone(),
                    position: pos,
                    driver: driver.name.clone(),
                    raw: d.time.clone(),
                });
            }

            if let Some(laps) = time.laps {
                outcome.warnings.push(Warning::ManualTimeEntry {
                    heat: heat.clone(),
                    position: pos,
                    driver: driver.name.clone(),
                    laps,
                });
            }

            for field in Field::DATA_FIELDS {
                outcome.clean_cells.insert(at(field));
            }

            fastest.offer(&driver.name, &d.best_lap);
        }

        // Error overrides clean
        let errors = outcome.error_cells.clone();
        outcome.clean_cells.retain(|c| !errors.contains(c));

        if let Some(writes) = fastest.pending_writes(race) {
            outcome.writes.extend(writes);
        }

        Ok(outcome)
    }

    /// Write the batch, then apply highlights
    pub async fn commit(&self, outcome: &ReconcileOutcome) -> IngestResult<()> {
        let writes: Vec<(CellRef, CellValue)> = outcome
            .writes
            .iter()
            .map(|(c, v)| (*c, v.clone()))
            .collect();
        self.store.batch_write(self.sheet, &writes).await?;
        info!(race = outcome.race, heat = %outcome.heat, cells = writes.len(), "Batch write committed");

        self.store
            .batch_highlight(self.sheet, &outcome.highlights())
            .await?;
        debug!(
            clean = outcome.clean_cells.len(),
            error = outcome.error_cells.len(),
            "Highlights applied"
        );
        Ok(())
    }
}

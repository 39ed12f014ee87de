//! Post-hoc name recheck of a race
//!
//! After reference tables are extended (a new driver handle, a new car
//! translation), already-written cells can be corrected in place. Every
//! driver and car cell of the race is re-resolved; alias hits are rewritten
//! to the canonical name and every cell that ends up canonical is
//! highlighted clean.

use racesheet_common::{CellRef, RangeRef};
use std::fmt;
use tracing::info;

use crate::error::IngestResult;
use crate::layout::{check_race, column_start, last_row, Field, FIRST_ROW};
use crate::reconcile::ReferenceTables;
use crate::store::{CellValue, Highlight, SheetStore};

/// Which column a recheck entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Driver,
    Car,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver => write!(f, "Driver"),
            Self::Car => write!(f, "Car"),
        }
    }
}

/// Alias rewritten to its canonical name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub kind: EntryKind,
    pub cell: CellRef,
    pub original: String,
    pub corrected: String,
}

/// Value found in neither the canonical nor the alias table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEntry {
    pub kind: EntryKind,
    pub cell: CellRef,
    pub value: String,
    pub suggestion: Option<String>,
}

/// Result of rechecking one race
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecheckReport {
    pub race: u32,
    pub corrections: Vec<Correction>,
    pub unresolved: Vec<UnresolvedEntry>,
    /// Cells highlighted clean (already canonical or corrected)
    pub clean_cells: usize,
}

impl RecheckReport {
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty() && self.unresolved.is_empty()
    }

    /// Operator-facing report
    pub fn lines(&self) -> Vec<String> {
        if self.is_clean() {
            return vec!["✅ All drivers and cars correct.".to_string()];
        }
        let mut lines = vec![format!("Recheck race {:02}", self.race)];
        for c in &self.corrections {
            lines.push(format!("✅ {}: `{}` → `{}`", c.kind, c.original, c.corrected));
        }
        for u in &self.unresolved {
            let mut line = format!("❌ {}: `{}` not in table", u.kind, u.value);
            if let Some(s) = &u.suggestion {
                line.push_str(&format!(" (did you mean `{}`?)", s));
            }
            lines.push(line);
        }
        lines
    }
}

/// Re-resolve every driver and car cell of `race`
pub async fn recheck_race(
    store: &dyn SheetStore,
    sheet: &str,
    tables: &ReferenceTables,
    race: u32,
) -> IngestResult<RecheckReport> {
    check_race(race)?;
    let driver_col = column_start(race) + Field::Driver.offset();
    let car_col = column_start(race) + Field::Car.offset();
    let car_idx = (car_col - driver_col) as usize;
    let range = RangeRef::new(
        CellRef::new(FIRST_ROW, driver_col),
        CellRef::new(last_row(), car_col),
    );
    let rows = store.read_range(sheet, range).await?;

    let mut report = RecheckReport {
        race,
        ..Default::default()
    };
    let mut writes: Vec<(CellRef, CellValue)> = Vec::new();
    let mut clean: Vec<(CellRef, Highlight)> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let abs_row = FIRST_ROW + i as u32;

        let driver = row.first().map(|s| s.trim()).unwrap_or("");
        if !driver.is_empty() {
            let cell = CellRef::new(abs_row, driver_col);
            if tables.is_canonical_driver(driver) {
                clean.push((cell, Highlight::Clean));
            } else if let Some(canonical) = tables.driver_alias(driver) {
                writes.push((cell, CellValue::text(canonical)));
                clean.push((cell, Highlight::Clean));
                report.corrections.push(Correction {
                    kind: EntryKind::Driver,
                    cell,
                    original: driver.to_string(),
                    corrected: canonical.to_string(),
                });
            } else {
                report.unresolved.push(UnresolvedEntry {
                    kind: EntryKind::Driver,
                    cell,
                    value: driver.to_string(),
                    suggestion: tables.suggest_driver(driver),
                });
            }
        }

        let car = row.get(car_idx).map(|s| s.trim()).unwrap_or("");
        if !car.is_empty() {
            let cell = CellRef::new(abs_row, car_col);
            if tables.is_canonical_car(car) {
                clean.push((cell, Highlight::Clean));
            } else if let Some(canonical) = tables.car_alias(car) {
                writes.push((cell, CellValue::text(canonical)));
                clean.push((cell, Highlight::Clean));
                report.corrections.push(Correction {
                    kind: EntryKind::Car,
                    cell,
                    original: car.to_string(),
                    corrected: canonical.to_string(),
                });
            } else {
                report.unresolved.push(UnresolvedEntry {
                    kind: EntryKind::Car,
                    cell,
                    value: car.to_string(),
                    suggestion: tables.suggest_car(car),
                });
            }
        }
    }

    if !writes.is_empty() {
        store.batch_write(sheet, &writes).await?;
    }
    if !clean.is_empty() {
        store.batch_highlight(sheet, &clean).await?;
    }
    report.clean_cells = clean.len();

    info!(
        race,
        corrected = report.corrections.len(),
        unresolved = report.unresolved.len(),
        "Recheck complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::cell;
    use crate::store::MemoryStore;

    fn tables() -> ReferenceTables {
        let mut t = ReferenceTables::new();
        t.add_driver("Bismark", "Red");
        t.add_driver_alias("Bis_GT7", "Bismark", "Red");
        t.add_car("Audi R8");
        t.add_car_alias("Audi R8 LMS (2015)", "Audi R8");
        t
    }

    #[tokio::test]
    async fn test_recheck_corrects_aliases_and_reports_unknown() {
        let store = MemoryStore::new();
        let race = 2;
        store
            .batch_write(
                "T",
                &[
                    (cell(race, 0, 1, Field::Driver), CellValue::text("Bismark")),
                    (cell(race, 0, 1, Field::Car), CellValue::text("audi r8")),
                    (cell(race, 1, 3, Field::Driver), CellValue::text("bis_gt7")),
                    (cell(race, 1, 3, Field::Car), CellValue::text("Audi R8 LMS (2015)")),
                    (cell(race, 3, 20, Field::Driver), CellValue::text("Stranger")),
                    (cell(race, 3, 20, Field::Car), CellValue::text("Mazda")),
                    // Other races are not touched
                    (cell(race + 1, 0, 1, Field::Driver), CellValue::text("bis_gt7")),
                ],
            )
            .await
            .unwrap();

        let report = recheck_race(&store, "T", &tables(), race).await.unwrap();
        assert_eq!(report.corrections.len(), 2);
        assert_eq!(report.unresolved.len(), 2);
        assert_eq!(report.clean_cells, 4);
        assert_eq!(report.corrections[0].corrected, "Bismark");
        assert_eq!(report.unresolved[0].kind, EntryKind::Driver);
        assert_eq!(report.unresolved[0].cell, cell(race, 3, 20, Field::Driver));

        assert_eq!(
            store.read_cell("T", cell(race, 1, 3, Field::Car)).await.unwrap(),
            CellValue::text("Audi R8")
        );
        assert_eq!(
            store.highlight("T", cell(race, 1, 3, Field::Driver)).await,
            Some(Highlight::Clean)
        );
        assert_eq!(store.highlight("T", cell(race, 3, 20, Field::Car)).await, None);
        assert_eq!(
            store.read_cell("T", cell(race + 1, 0, 1, Field::Driver)).await.unwrap(),
            CellValue::text("bis_gt7")
        );

        let lines = report.lines();
        assert_eq!(lines[0], "Recheck race 02");
        assert!(lines.iter().any(|l| l.contains("`Stranger` not in table")));
    }

    #[tokio::test]
    async fn test_recheck_rejects_race_outside_sheet() {
        let store = MemoryStore::new();
        for race in [0, crate::layout::MAX_RACE + 1] {
            let err = recheck_race(&store, "T", &tables(), race).await.unwrap_err();
            assert!(matches!(
                err,
                crate::error::IngestError::Common(racesheet_common::Error::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_recheck_empty_race_is_clean() {
        let store = MemoryStore::new();
        let report = recheck_race(&store, "T", &tables(), 1).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.lines(), vec!["✅ All drivers and cars correct.".to_string()]);
    }
}

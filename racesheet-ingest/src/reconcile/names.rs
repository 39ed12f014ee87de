//! Driver and car name resolution
//!
//! Resolves raw names read from a screenshot against the reference tables
//! held in the workbook:
//!
//! - **Drivers:** canonical table (name, team) first, then the alias column
//!   (in-game handles) mapping to the same (name, team) pair
//! - **Cars:** alias table (in-game name → canonical) first; a raw name that is
//!   already canonical is accepted as-is
//!
//! All lookups are case-insensitive. Resolution is side-effect-free; callers
//! decide how to surface unresolved names.

use racesheet_common::config::SheetsConfig;
use racesheet_common::RangeRef;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::error::IngestResult;
use crate::store::SheetStore;

/// Minimum normalized Levenshtein similarity for a "did you mean" hint
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Resolved driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverResolution {
    pub name: String,
    /// Empty when unresolved
    pub team: String,
    pub resolved: bool,
}

/// Resolved car
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarResolution {
    pub name: String,
    pub resolved: bool,
}

/// Snapshot of the workbook reference tables
///
/// Read-only during a reconciliation pass; reloaded wholesale between passes.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    /// lower(name) → (name, team)
    drivers: HashMap<String, (String, String)>,
    /// lower(alias) → (name, team)
    driver_aliases: HashMap<String, (String, String)>,
    /// Canonical car names in sheet order
    cars: Vec<String>,
    cars_lower: HashSet<String>,
    /// lower(alias) → canonical car name
    car_aliases: HashMap<String, String>,
}

fn key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn column(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.trim()).unwrap_or("")
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all reference regions from the store
    ///
    /// **Regions:**
    /// - car list: first column of `cars_range`
    /// - car translation: `car_aliases_range`, col 0 canonical, col 1 alias
    /// - drivers: `drivers_range`, col 0 name, col `driver_team_offset` team
    /// - driver aliases: `driver_aliases_range`, aligned with drivers by row
    pub async fn load(store: &dyn SheetStore, sheets: &SheetsConfig) -> IngestResult<Self> {
        let mut tables = Self::new();

        let car_rows = store
            .read_range(&sheets.cars, RangeRef::parse(&sheets.cars_range)?)
            .await?;
        for row in &car_rows {
            let name = column(row, 0);
            if !name.is_empty() {
                tables.add_car(name);
            }
        }

        let alias_rows = store
            .read_range(&sheets.car_aliases, RangeRef::parse(&sheets.car_aliases_range)?)
            .await?;
        for row in &alias_rows {
            let canonical = column(row, 0);
            let alias = column(row, 1);
            if !canonical.is_empty() && !alias.is_empty() {
                tables.add_car_alias(alias, canonical);
            }
        }

        let driver_rows = store
            .read_range(&sheets.drivers, RangeRef::parse(&sheets.drivers_range)?)
            .await?;
        let handle_rows = store
            .read_range(&sheets.drivers, RangeRef::parse(&sheets.driver_aliases_range)?)
            .await?;
        let team_col = sheets.driver_team_offset as usize;
        for (i, row) in driver_rows.iter().enumerate() {
            let name = column(row, 0);
            if name.is_empty() {
                continue;
            }
            let team = column(row, team_col);
            tables.add_driver(name, team);

            let alias = handle_rows.get(i).map(|r| column(r, 0)).unwrap_or("");
            if !alias.is_empty() {
                tables.add_driver_alias(alias, name, team);
            }
        }

        if tables.cars.is_empty() {
            warn!(sheet = %sheets.cars, range = %sheets.cars_range, "Car list is empty");
        }
        if tables.drivers.is_empty() {
            warn!(sheet = %sheets.drivers, range = %sheets.drivers_range, "Driver list is empty");
        }
        info!(
            drivers = tables.drivers.len(),
            driver_aliases = tables.driver_aliases.len(),
            cars = tables.cars.len(),
            car_aliases = tables.car_aliases.len(),
            "Reference tables loaded"
        );

        Ok(tables)
    }

    pub fn add_driver(&mut self, name: &str, team: &str) {
        self.drivers
            .insert(key(name), (name.trim().to_string(), team.trim().to_string()));
    }

    pub fn add_driver_alias(&mut self, alias: &str, name: &str, team: &str) {
        self.driver_aliases
            .insert(key(alias), (name.trim().to_string(), team.trim().to_string()));
    }

    pub fn add_car(&mut self, name: &str) {
        if self.cars_lower.insert(key(name)) {
            self.cars.push(name.trim().to_string());
        }
    }

    pub fn add_car_alias(&mut self, alias: &str, canonical: &str) {
        self.car_aliases.insert(key(alias), canonical.trim().to_string());
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// Canonical driver or alias → (name, team, resolved)
    pub fn resolve_driver(&self, raw: &str) -> DriverResolution {
        let k = key(raw);
        match self.drivers.get(&k).or_else(|| self.driver_aliases.get(&k)) {
            Some((name, team)) => DriverResolution {
                name: name.clone(),
                team: team.clone(),
                resolved: true,
            },
            None => DriverResolution {
                name: raw.to_string(),
                team: String::new(),
                resolved: false,
            },
        }
    }

    /// Alias substitution; a raw name already in the car list is never flagged
    pub fn resolve_car(&self, raw: &str) -> CarResolution {
        let k = key(raw);
        if let Some(canonical) = self.car_aliases.get(&k) {
            return CarResolution {
                name: canonical.clone(),
                resolved: true,
            };
        }
        CarResolution {
            name: raw.to_string(),
            resolved: self.cars_lower.contains(&k),
        }
    }

    pub fn is_canonical_driver(&self, value: &str) -> bool {
        self.drivers.contains_key(&key(value))
    }

    /// Canonical name for a driver alias
    pub fn driver_alias(&self, value: &str) -> Option<&str> {
        self.driver_aliases.get(&key(value)).map(|(name, _)| name.as_str())
    }

    pub fn is_canonical_car(&self, value: &str) -> bool {
        self.cars_lower.contains(&key(value))
    }

    /// Canonical name for a car alias
    pub fn car_alias(&self, value: &str) -> Option<&str> {
        self.car_aliases.get(&key(value)).map(String::as_str)
    }

    /// Closest canonical driver name, if similar enough
    pub fn suggest_driver(&self, raw: &str) -> Option<String> {
        suggest(raw, self.drivers.values().map(|(name, _)| name.as_str()))
    }

    /// Closest canonical car name, if similar enough
    pub fn suggest_car(&self, raw: &str) -> Option<String> {
        suggest(raw, self.cars.iter().map(String::as_str))
    }
}

/// Best candidate by normalized Levenshtein similarity (>= threshold).
///
/// Ties keep the lexicographically smaller name so the hint is stable across
/// table reloads.
pub fn suggest<'a, I>(raw: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = key(raw);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<(f64, &str)> = None;
    for candidate in candidates {
        let similarity = strsim::normalized_levenshtein(&needle, &key(candidate));
        if similarity < SUGGESTION_THRESHOLD {
            continue;
        }
        best = match best {
            Some((s, c)) if s > similarity || (s == similarity && c <= candidate) => Some((s, c)),
            _ => Some((similarity, candidate)),
        };
    }
    best.map(|(_, c)| c.to_string())
}

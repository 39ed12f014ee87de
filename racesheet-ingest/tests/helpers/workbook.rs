//! Workbook seeding and record builders

use racesheet_common::config::SheetsConfig;
use racesheet_common::CellRef;
use racesheet_ingest::{CellValue, DriverResult, MemoryStore, RaceResultRecord, SheetStore};
use serde_json::json;

fn at(a1: &str) -> CellRef {
    CellRef::parse_a1(a1).unwrap()
}

/// Store with the default reference regions filled in
///
/// Drivers: Anna, Ben (handle "BenGT7"), Cleo, Dario, Maximilian
/// Cars: "BMW M6 GT3", "Porsche 911 RSR", "Audi R8"; "Audi R8 LMS (2015)" translates to "Audi R8"
pub async fn seeded_store() -> MemoryStore {
    let sheets = SheetsConfig::default();
    let store = MemoryStore::new();

    store
        .batch_write(
            &sheets.cars,
            &[
                (at("R8"), CellValue::text("BMW M6 GT3")),
                (at("R9"), CellValue::text("Porsche 911 RSR")),
                (at("R10"), CellValue::text("Audi R8")),
            ],
        )
        .await
        .unwrap();

    store
        .batch_write(
            &sheets.car_aliases,
            &[
                (at("A2"), CellValue::text("Audi R8")),
                (at("B2"), CellValue::text("Audi R8 LMS (2015)")),
            ],
        )
        .await
        .unwrap();

    let drivers = [
        ("Anna", "Red", ""),
        ("Ben", "Blue", "BenGT7"),
        ("Cleo", "Green", ""),
        ("Dario", "Red", ""),
        ("Maximilian", "Green", ""),
    ];
    let mut cells = Vec::new();
    for (i, (name, team, handle)) in drivers.iter().enumerate() {
        let row = 5 + i as u32;
        cells.push((CellRef::new(row, 3), CellValue::text(*name)));
        cells.push((CellRef::new(row, 11), CellValue::text(*team)));
        if !handle.is_empty() {
            cells.push((at(&format!("DB{}", row)), CellValue::text(*handle)));
        }
    }
    store.batch_write(&sheets.drivers, &cells).await.unwrap();

    store
}

/// (position, driver, car, time, best lap)
pub type Row<'a> = (u32, &'a str, &'a str, &'a str, &'a str);

#[allow(dead_code)]
pub fn record(race: u32, heat: &str, rows: &[Row<'_>]) -> RaceResultRecord {
    RaceResultRecord {
        race,
        heat: heat.to_string(),
        drivers: rows
            .iter()
            .map(|(position, driver, car, time, best_lap)| DriverResult {
                position: *position,
                driver: driver.to_string(),
                car: car.to_string(),
                time: time.to_string(),
                best_lap: best_lap.to_string(),
            })
            .collect(),
    }
}

/// Extraction answer using the service's native keys, fenced like the real service
#[allow(dead_code)]
pub fn native_response(race: u32, heat: &str, rows: &[Row<'_>]) -> String {
    let fahrer: Vec<_> = rows
        .iter()
        .map(|(position, name, car, time, best_lap)| {
            json!({
                "position": position,
                "name": name,
                "auto": car,
                "zeit": time,
                "beste_runde": best_lap,
            })
        })
        .collect();
    let body = json!({ "rennen": race, "grid": heat, "fahrer": fahrer });
    format!("```json\n{}\n```", serde_json::to_string_pretty(&body).unwrap())
}

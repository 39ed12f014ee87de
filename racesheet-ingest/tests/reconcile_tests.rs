//! End-to-end reconciliation through the pipeline against a seeded workbook

mod helpers;

use helpers::{capture_logs, record, seeded_store};
use racesheet_common::config::TomlConfig;
use racesheet_ingest::layout::{cell, fastest_lap_cells, grid_label_cell, Field};
use racesheet_ingest::{CellValue, Highlight, IngestError, IngestPipeline, MemoryStore, SheetStore, Warning};
use std::sync::Arc;

const SHEET: &str = "T";

async fn pipeline() -> (Arc<MemoryStore>, IngestPipeline) {
    let store = Arc::new(seeded_store().await);
    let pipeline = IngestPipeline::new(store.clone(), TomlConfig::default());
    (store, pipeline)
}

async fn text(store: &MemoryStore, c: racesheet_common::CellRef) -> String {
    store.read_cell(SHEET, c).await.unwrap().display()
}

#[tokio::test]
async fn test_race_seven_heat_order_one_three_two_b() {
    let (store, mut pipeline) = pipeline().await;
    let (_logs, _guard) = capture_logs();

    let heat_one = record(7, "1", &[(1, "Anna", "BMW M6 GT3", "50:28,752", "")]);
    let heat_three = record(
        7,
        "3",
        &[
            (1, "Cleo", "Audi R8", "51:00,000", ""),
            (2, "Dario", "Audi R8", "+02,000", ""),
        ],
    );
    let heat_two_b = record(7, "2b", &[(1, "Ben", "Porsche 911 RSR", "50:40,000", "")]);

    pipeline.process_record(&heat_one, None).await.unwrap();
    let three = pipeline.process_record(&heat_three, None).await.unwrap();
    assert_eq!(text(&store, grid_label_cell(7, 2)).await, "3");
    assert_eq!(three.page, 1);

    pipeline.process_record(&heat_two_b, None).await.unwrap();

    assert_eq!(text(&store, grid_label_cell(7, 0)).await, "1");
    assert_eq!(text(&store, grid_label_cell(7, 2)).await, "2b");
    assert_eq!(text(&store, grid_label_cell(7, 3)).await, "3");

    // Heat 3 data moved intact, heat 2b written in its place
    assert_eq!(text(&store, cell(7, 3, 1, Field::Driver)).await, "Cleo");
    assert_eq!(text(&store, cell(7, 3, 2, Field::Driver)).await, "Dario");
    assert_eq!(
        store.read_cell(SHEET, cell(7, 3, 1, Field::RaceTime)).await.unwrap(),
        CellValue::Number(5100000)
    );
    assert_eq!(text(&store, cell(7, 2, 1, Field::Driver)).await, "Ben");
    assert_eq!(text(&store, cell(7, 2, 2, Field::Driver)).await, "");
    assert_eq!(text(&store, cell(7, 2, 2, Field::RaceTime)).await, "");
}

#[tokio::test]
async fn test_relocation_is_logged() {
    let (_store, mut pipeline) = pipeline().await;
    let (logs, _guard) = capture_logs();

    pipeline
        .process_record(&record(2, "3", &[(1, "Anna", "Audi R8", "1:00,000", "")]), None)
        .await
        .unwrap();
    logs.assert_no_match("relocating");

    pipeline
        .process_record(&record(2, "2b", &[(1, "Ben", "Audi R8", "1:00,000", "")]), None)
        .await
        .unwrap();
    logs.assert_contains("Grid 3 occupies block 2, relocating");
    logs.assert_contains("Block relocated");
}

#[tokio::test]
async fn test_three_after_two_b_goes_to_last_block() {
    let (store, mut pipeline) = pipeline().await;
    pipeline
        .process_record(&record(1, "2B", &[(1, "Anna", "Audi R8", "1:00,000", "")]), None)
        .await
        .unwrap();
    pipeline
        .process_record(&record(1, "3", &[(1, "Ben", "Audi R8", "1:00,000", "")]), None)
        .await
        .unwrap();

    assert_eq!(text(&store, grid_label_cell(1, 2)).await, "2B");
    assert_eq!(text(&store, cell(1, 3, 1, Field::Driver)).await, "Ben");
}

#[tokio::test]
async fn test_delta_violation_highlighted_and_warned() {
    let (store, mut pipeline) = pipeline().await;
    let (logs, _guard) = capture_logs();

    let rec = record(
        3,
        "1",
        &[
            (1, "Anna", "BMW M6 GT3", "50:28,752", ""),
            (2, "Ben", "BMW M6 GT3", "+06,425", ""),
            (3, "Cleo", "BMW M6 GT3", "+03,000", ""),
        ],
    );
    let processed = pipeline.process_record(&rec, None).await.unwrap();

    assert_eq!(
        processed.warnings,
        vec![Warning::DeltaViolation {
            heat: "1".into(),
            position: 3,
            driver: "Cleo".into(),
        }]
    );
    assert_eq!(
        store.highlight(SHEET, cell(3, 0, 3, Field::RaceTime)).await,
        Some(Highlight::Error)
    );
    assert_eq!(
        store.highlight(SHEET, cell(3, 0, 2, Field::RaceTime)).await,
        Some(Highlight::Clean)
    );
    assert_eq!(
        store.read_cell(SHEET, cell(3, 0, 3, Field::RaceTime)).await.unwrap(),
        CellValue::Number(3000)
    );
    assert_eq!(logs.fields_of("Delta not increasing").len(), 1);
    assert!(logs.fields_of("Delta not increasing")[0].contains("position=3"));
}

#[tokio::test]
async fn test_time_tokens_written_as_numbers_or_empty() {
    let (store, mut pipeline) = pipeline().await;
    let rec = record(
        4,
        "2",
        &[
            (1, "Anna", "Audi R8", "50:28,752", ""),
            (2, "Ben", "Audi R8", "+06,425", ""),
            (3, "Cleo", "Audi R8", "2 Runden", ""),
            (4, "Dario", "Audi R8", "DNF", ""),
        ],
    );
    let processed = pipeline.process_record(&rec, None).await.unwrap();

    let rt = |pos| cell(4, 1, pos, Field::RaceTime);
    let laps = |pos| cell(4, 1, pos, Field::Laps);
    assert_eq!(store.read_cell(SHEET, rt(1)).await.unwrap(), CellValue::Number(5028752));
    assert_eq!(store.read_cell(SHEET, rt(2)).await.unwrap(), CellValue::Number(6425));
    assert_eq!(store.read_cell(SHEET, rt(3)).await.unwrap(), CellValue::Empty);
    assert_eq!(store.read_cell(SHEET, laps(3)).await.unwrap(), CellValue::Number(2));
    assert_eq!(store.read_cell(SHEET, rt(4)).await.unwrap(), CellValue::Empty);
    assert_eq!(store.read_cell(SHEET, laps(4)).await.unwrap(), CellValue::Empty);

    assert_eq!(processed.warnings.len(), 1);
    assert!(matches!(
        processed.warnings[0],
        Warning::ManualTimeEntry { position: 3, laps: 2, .. }
    ));
}

#[tokio::test]
async fn test_names_resolved_through_reference_tables() {
    let (store, mut pipeline) = pipeline().await;
    let rec = record(
        5,
        "1",
        &[
            (1, "bengt7", "audi r8 lms (2015)", "50:00,000", ""),
            (2, "Maximillian", "Mazda Roadster", "+01,000", ""),
        ],
    );
    let processed = pipeline.process_record(&rec, None).await.unwrap();

    assert_eq!(text(&store, cell(5, 0, 1, Field::Driver)).await, "Ben");
    assert_eq!(text(&store, cell(5, 0, 1, Field::Team)).await, "Blue");
    assert_eq!(text(&store, cell(5, 0, 1, Field::Car)).await, "Audi R8");

    assert_eq!(text(&store, cell(5, 0, 2, Field::Driver)).await, "Maximillian");
    assert_eq!(text(&store, cell(5, 0, 2, Field::Team)).await, "");
    assert_eq!(
        store.highlight(SHEET, cell(5, 0, 2, Field::Driver)).await,
        Some(Highlight::Error)
    );
    assert_eq!(
        store.highlight(SHEET, cell(5, 0, 2, Field::Car)).await,
        Some(Highlight::Error)
    );
    assert_eq!(
        store.highlight(SHEET, cell(5, 0, 2, Field::Team)).await,
        Some(Highlight::Clean)
    );

    assert!(matches!(
        &processed.warnings[0],
        Warning::DriverUnresolved { suggestion: Some(s), .. } if s == "Maximilian"
    ));
    assert!(matches!(processed.warnings[1], Warning::CarUnresolved { .. }));
}

#[tokio::test]
async fn test_race_override_warns_on_mismatch() {
    let (store, mut pipeline) = pipeline().await;
    let rec = record(6, "3", &[(11, "Anna", "Audi R8", "+40,000", "")]);

    let processed = pipeline.process_record(&rec, Some(7)).await.unwrap();
    assert_eq!(processed.race, 7);
    assert_eq!(processed.page, 2);
    assert_eq!(
        processed.warnings[0],
        Warning::RaceNumberMismatch {
            screenshot_race: 6,
            used_race: 7,
            heat: "3".into(),
            page: 2,
        }
    );
    assert_eq!(text(&store, cell(7, 2, 11, Field::Driver)).await, "Anna");
    assert_eq!(text(&store, cell(6, 2, 11, Field::Driver)).await, "");

    // Unread race number (0) never warns
    let unread = record(0, "1", &[(1, "Anna", "Audi R8", "1:00,000", "")]);
    let processed = pipeline.process_record(&unread, Some(7)).await.unwrap();
    assert!(processed.warnings.is_empty());
}

#[tokio::test]
async fn test_missing_race_number_aborts_without_writes() {
    let (store, mut pipeline) = pipeline().await;
    let rec = record(0, "1", &[(1, "Anna", "Audi R8", "1:00,000", "")]);

    let err = pipeline.process_record(&rec, None).await.unwrap_err();
    assert!(matches!(err, IngestError::ExtractionMalformed(_)));
    assert_eq!(store.cell_count(SHEET).await, 0);
}

#[tokio::test]
async fn test_fastest_lap_tracked_across_heats() {
    let (store, mut pipeline) = pipeline().await;
    let (fl_driver, fl_time) = fastest_lap_cells(8);

    pipeline
        .process_record(
            &record(
                8,
                "1",
                &[
                    (1, "Anna", "Audi R8", "50:00,000", "8:27,088"),
                    (2, "Ben", "Audi R8", "+01,000", "8:26,900"),
                ],
            ),
            None,
        )
        .await
        .unwrap();
    assert_eq!(text(&store, fl_driver).await, "Ben");
    assert_eq!(store.read_cell(SHEET, fl_time).await.unwrap(), CellValue::Number(826900));

    // Equal time in a later heat does not displace the holder
    pipeline
        .process_record(&record(8, "2", &[(1, "Cleo", "Audi R8", "50:00,000", "8:26,900")]), None)
        .await
        .unwrap();
    assert_eq!(text(&store, fl_driver).await, "Ben");

    pipeline
        .process_record(&record(8, "3", &[(1, "Dario", "Audi R8", "50:00,000", "8:25,000")]), None)
        .await
        .unwrap();
    assert_eq!(text(&store, fl_driver).await, "Dario");
}

#[tokio::test]
async fn test_recheck_and_summary_after_reference_update() {
    let (store, mut pipeline) = pipeline().await;
    pipeline
        .process_record(&record(9, "1", &[(1, "NewHandle", "Audi R8", "50:00,000", "8:30,000")]), None)
        .await
        .unwrap();

    let report = pipeline.recheck_race(9).await.unwrap();
    assert_eq!(report.unresolved.len(), 1);

    // Operator adds the handle to the alias column of Anna's row
    store
        .write_cell(
            "DB_drvr",
            racesheet_common::CellRef::parse_a1("DB5").unwrap(),
            CellValue::text("NewHandle"),
        )
        .await
        .unwrap();

    let report = pipeline.recheck_race(9).await.unwrap();
    assert_eq!(report.corrections.len(), 1);
    assert_eq!(report.corrections[0].corrected, "Anna");
    assert_eq!(text(&store, cell(9, 0, 1, Field::Driver)).await, "Anna");

    let summary = pipeline.race_summary(9).await.unwrap();
    assert_eq!(summary.winners[0].driver, "Anna");
    assert_eq!(summary.lines()[0], "Race 09");
    assert_eq!(summary.fastest_lap, Some(("830000".to_string(), "NewHandle".to_string())));
}

#[tokio::test]
async fn test_workbook_file_round_trip() {
    let (store, mut pipeline) = pipeline().await;
    pipeline
        .process_record(&record(1, "1", &[(1, "Anna", "Audi R8", "50:00,000", "")]), None)
        .await
        .unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("workbook.json");
    store.save_file(&path).await.unwrap();

    let loaded = MemoryStore::load_file(&path).await.unwrap();
    assert_eq!(
        loaded.read_cell(SHEET, cell(1, 0, 1, Field::RaceTime)).await.unwrap(),
        CellValue::Number(5000000)
    );
    assert_eq!(
        loaded.highlight(SHEET, grid_label_cell(1, 0)).await,
        Some(Highlight::Clean)
    );
}

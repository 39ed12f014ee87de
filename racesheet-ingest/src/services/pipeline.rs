//! Ingest pipeline
//!
//! Sequences one screenshot end to end:
//! quota gate → extraction (+ optional verification pass) → reference reload
//! → reconciliation → commit. Records are processed strictly one at a time
//! (`&mut self`), and a record's writes are committed before the call returns,
//! so the next record's block resolution sees them.

use racesheet_common::config::{TomlConfig, VerifyMode};
use racesheet_common::CellRef;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::extraction::{
    parse_extraction_response, ExtractionClient, ExtractionFailure, ImagePayload, Instruction,
};
use super::ordering::markers_for;
use super::quota::QuotaScheduler;
use super::recheck::{recheck_race, RecheckReport};
use super::summary::{race_summary, RaceSummary};
use crate::error::{IngestError, IngestResult};
use crate::layout::check_race;
use crate::models::RaceResultRecord;
use crate::reconcile::{validate_deltas, ReconciliationEngine, ReferenceTables, Warning};
use crate::store::{Highlight, SheetStore};

/// Per-image result handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Race written to
    pub race: u32,
    pub heat: String,
    pub first_position: Option<u32>,
    pub page: u32,
    pub heat_marker: &'static str,
    pub page_marker: &'static str,
    pub warnings: Vec<Warning>,
    pub highlights: Vec<(CellRef, Highlight)>,
}

impl ProcessedImage {
    /// One-line caption for the re-posted screenshot
    pub fn caption(&self) -> String {
        format!(
            "{}{} Race {:02}, grid {}, page {}",
            self.heat_marker, self.page_marker, self.race, self.heat, self.page
        )
    }
}

/// Field that changed between extraction passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub position: u32,
    pub field: &'static str,
    pub before: String,
    pub after: String,
}

/// Per-field differences between two passes, matched by position
pub fn extraction_diffs(first: &RaceResultRecord, second: &RaceResultRecord) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    for a in first.sorted_drivers() {
        let Some(b) = second.drivers.iter().find(|d| d.position == a.position) else {
            continue;
        };
        for (field, before, after) in [
            ("driver", &a.driver, &b.driver),
            ("car", &a.car, &b.car),
            ("time", &a.time, &b.time),
            ("best_lap", &a.best_lap, &b.best_lap),
        ] {
            if before != after {
                diffs.push(FieldDiff {
                    position: a.position,
                    field,
                    before: before.clone(),
                    after: after.clone(),
                });
            }
        }
    }
    diffs
}

/// Owns the store handle, extraction client, quota gate and reference snapshot
pub struct IngestPipeline {
    store: Arc<dyn SheetStore>,
    client: Option<Arc<dyn ExtractionClient>>,
    quota: QuotaScheduler,
    tables: ReferenceTables,
    config: TomlConfig,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn SheetStore>, config: TomlConfig) -> Self {
        Self {
            store,
            client: None,
            quota: QuotaScheduler::new(&config.quota),
            tables: ReferenceTables::new(),
            config,
        }
    }

    pub fn with_client(mut self, client: Arc<dyn ExtractionClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn quota(&self) -> &QuotaScheduler {
        &self.quota
    }

    pub fn quota_mut(&mut self) -> &mut QuotaScheduler {
        &mut self.quota
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn config(&self) -> &TomlConfig {
        &self.config
    }

    /// Extract, reconcile and commit one screenshot
    ///
    /// `current_race` overrides the race number read from the image.
    pub async fn process_image(
        &mut self,
        image: &ImagePayload,
        current_race: Option<u32>,
    ) -> IngestResult<ProcessedImage> {
        info!(image = %image.name, "Processing screenshot");
        let record = self.extract(image).await?;
        self.process_record(&record, current_race).await
    }

    /// Extraction with the configured verification pass
    pub async fn extract(&mut self, image: &ImagePayload) -> IngestResult<RaceResultRecord> {
        let first = self.call(image, &Instruction::Extract).await?;
        info!(
            race = first.race,
            heat = %first.heat,
            drivers = first.drivers.len(),
            "Extraction pass 1 complete"
        );

        let verify = match self.config.extraction.verify {
            VerifyMode::Never => false,
            VerifyMode::Always => true,
            VerifyMode::OnDeltaErrors => !validate_deltas(&first.drivers).is_empty(),
        };
        if !verify {
            return Ok(first);
        }

        info!("Starting verification pass");
        let previous = serde_json::to_string_pretty(&first)
            .map_err(|e| IngestError::Extraction(format!("Serialize first pass failed: {}", e)))?;
        let second = self.call(image, &Instruction::Verify { previous }).await?;
        for diff in extraction_diffs(&first, &second) {
            warn!(
                position = diff.position,
                field = diff.field,
                before = %diff.before,
                after = %diff.after,
                "Verification pass changed field"
            );
        }
        info!("Verification pass complete");
        Ok(second)
    }

    /// One gated upstream call
    async fn call(
        &mut self,
        image: &ImagePayload,
        instruction: &Instruction,
    ) -> IngestResult<RaceResultRecord> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| IngestError::Extraction("no extraction client configured".to_string()))?;

        self.quota.check()?;

        match client.extract(image, instruction).await {
            Ok(text) => {
                self.quota.record_success();
                parse_extraction_response(&text)
            }
            Err(ExtractionFailure::Quota(kind)) => {
                let until = self.quota.record_failure(kind);
                Err(IngestError::QuotaExceeded { kind, until })
            }
            Err(ExtractionFailure::Other(message)) => {
                error!(image = %image.name, error = %message, "Extraction call failed");
                Err(IngestError::Extraction(message))
            }
        }
    }

    /// Reload the reference snapshot; on failure the previous one is kept
    pub async fn reload_references(&mut self) {
        match ReferenceTables::load(self.store.as_ref(), &self.config.sheets).await {
            Ok(tables) => self.tables = tables,
            Err(e) => error!(error = %e, "Reference table reload failed, keeping previous snapshot"),
        }
    }

    /// Reconcile and commit an already-extracted record
    pub async fn process_record(
        &mut self,
        record: &RaceResultRecord,
        current_race: Option<u32>,
    ) -> IngestResult<ProcessedImage> {
        let race = current_race.unwrap_or(record.race);
        if race == 0 {
            return Err(IngestError::ExtractionMalformed(
                "race number missing and no current race given".to_string(),
            ));
        }
        check_race(race).map_err(|e| IngestError::ExtractionMalformed(e.to_string()))?;

        self.reload_references().await;

        let engine = ReconciliationEngine::new(
            self.store.as_ref(),
            &self.tables,
            &self.config.sheets.results,
        )
        .with_relocation_pause(Duration::from_millis(self.config.store.relocation_pause_ms));
        let outcome = engine.reconcile(record, race).await?;
        engine.commit(&outcome).await?;

        let page = outcome.page();
        let mut warnings = Vec::with_capacity(outcome.warnings.len() + 1);
        if record.race != 0 && record.race != race {
            warn!(
                screenshot_race = record.race,
                current_race = race,
                "Race number in screenshot differs from current race"
            );
            warnings.push(Warning::RaceNumberMismatch {
                screenshot_race: record.race,
                used_race: race,
                heat: outcome.heat.clone(),
                page,
            });
        }
        warnings.extend(outcome.warnings.iter().cloned());

        let (heat_marker, page_marker) = markers_for(&outcome.heat, page);
        info!(
            race,
            heat = %outcome.heat,
            page,
            warnings = warnings.len(),
            "Record processed"
        );

        Ok(ProcessedImage {
            race,
            heat: outcome.heat.clone(),
            first_position: outcome.first_position,
            page,
            heat_marker,
            page_marker,
            warnings,
            highlights: outcome.highlights(),
        })
    }

    /// Re-resolve names already written for `race` against fresh tables
    pub async fn recheck_race(&mut self, race: u32) -> IngestResult<RecheckReport> {
        self.reload_references().await;
        recheck_race(
            self.store.as_ref(),
            &self.config.sheets.results,
            &self.tables,
            race,
        )
        .await
    }

    pub async fn race_summary(&self, race: u32) -> IngestResult<RaceSummary> {
        race_summary(self.store.as_ref(), &self.config.sheets.results, race).await
    }
}

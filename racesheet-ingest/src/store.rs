//! Tabular store seam
//!
//! The workbook is the single source of truth for block assignment, fastest
//! laps and reference tables; nothing read from it is cached across records.
//! [`MemoryStore`] is the in-process implementation used by the CLI (persisted
//! as a JSON workbook file) and by tests.

use async_trait::async_trait;
use racesheet_common::{CellRef, RangeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::{IngestError, IngestResult};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(i64),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    /// Number if present, otherwise empty
    pub fn number_or_empty(value: Option<u64>) -> Self {
        match value.and_then(|v| i64::try_from(v).ok()) {
            Some(v) => Self::Number(v),
            None => Self::Empty,
        }
    }

    /// Displayed text of the cell
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Empty => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Empty
    }
}

/// Text highlight applied to a written cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Grey text: written and passed every check
    Clean,
    /// Red text: a check fired for this cell
    Error,
}

/// Worksheet-addressed cell store
///
/// Reads of missing worksheets or cells yield empty values.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn read_cell(&self, sheet: &str, cell: CellRef) -> IngestResult<CellValue>;

    /// Rows of displayed text covering `range` (row-major)
    async fn read_range(&self, sheet: &str, range: RangeRef) -> IngestResult<Vec<Vec<String>>>;

    async fn write_cell(&self, sheet: &str, cell: CellRef, value: CellValue) -> IngestResult<()>;

    async fn batch_write(&self, sheet: &str, writes: &[(CellRef, CellValue)]) -> IngestResult<()>;

    async fn batch_highlight(
        &self,
        sheet: &str,
        highlights: &[(CellRef, Highlight)],
    ) -> IngestResult<()>;
}

#[derive(Debug, Clone, Default)]
struct Worksheet {
    cells: BTreeMap<CellRef, CellValue>,
    highlights: BTreeMap<CellRef, Highlight>,
}

impl Worksheet {
    fn set(&mut self, cell: CellRef, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, value);
        }
    }
}

/// On-disk workbook shape: cells keyed by A1 address
#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkbookFile {
    #[serde(default)]
    sheets: BTreeMap<String, WorksheetFile>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorksheetFile {
    #[serde(default)]
    cells: BTreeMap<String, CellValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    highlights: BTreeMap<String, Highlight>,
}

/// In-memory workbook
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: RwLock<BTreeMap<String, Worksheet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON workbook file
    pub fn from_json(json: &str) -> IngestResult<Self> {
        let file: WorkbookFile = serde_json::from_str(json)
            .map_err(|e| IngestError::Store(format!("Invalid workbook JSON: {}", e)))?;

        let mut sheets = BTreeMap::new();
        for (name, ws) in file.sheets {
            let mut sheet = Worksheet::default();
            for (addr, value) in ws.cells {
                sheet.set(CellRef::parse_a1(&addr)?, value);
            }
            for (addr, highlight) in ws.highlights {
                sheet.highlights.insert(CellRef::parse_a1(&addr)?, highlight);
            }
            sheets.insert(name, sheet);
        }

        Ok(Self {
            sheets: RwLock::new(sheets),
        })
    }

    /// Serialize to a JSON workbook file body
    pub async fn to_json(&self) -> IngestResult<String> {
        let sheets = self.sheets.read().await;
        let file = WorkbookFile {
            sheets: sheets
                .iter()
                .map(|(name, ws)| {
                    (
                        name.clone(),
                        WorksheetFile {
                            cells: ws.cells.iter().map(|(c, v)| (c.to_a1(), v.clone())).collect(),
                            highlights: ws
                                .highlights
                                .iter()
                                .map(|(c, h)| (c.to_a1(), *h))
                                .collect(),
                        },
                    )
                })
                .collect(),
        };
        serde_json::to_string_pretty(&file)
            .map_err(|e| IngestError::Store(format!("Serialize workbook failed: {}", e)))
    }

    pub async fn load_file(path: &Path) -> IngestResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IngestError::Store(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Write atomically: serialize to `<path>.tmp`, then rename over target
    pub async fn save_file(&self, path: &Path) -> IngestResult<()> {
        let json = self.to_json().await?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp_path = PathBuf::from(tmp);

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| IngestError::Store(format!("Write {} failed: {}", tmp_path.display(), e)))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| IngestError::Store(format!("Replace {} failed: {}", path.display(), e)))
    }

    /// Current highlight of a cell
    pub async fn highlight(&self, sheet: &str, cell: CellRef) -> Option<Highlight> {
        let sheets = self.sheets.read().await;
        sheets.get(sheet).and_then(|ws| ws.highlights.get(&cell).copied())
    }

    /// Number of non-empty cells in a worksheet
    pub async fn cell_count(&self, sheet: &str) -> usize {
        let sheets = self.sheets.read().await;
        sheets.get(sheet).map(|ws| ws.cells.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SheetStore for MemoryStore {
    async fn read_cell(&self, sheet: &str, cell: CellRef) -> IngestResult<CellValue> {
        let sheets = self.sheets.read().await;
        Ok(sheets
            .get(sheet)
            .and_then(|ws| ws.cells.get(&cell).cloned())
            .unwrap_or_default())
    }

    async fn read_range(&self, sheet: &str, range: RangeRef) -> IngestResult<Vec<Vec<String>>> {
        let sheets = self.sheets.read().await;
        let ws = sheets.get(sheet);
        let rows = (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| {
                        ws.and_then(|ws| ws.cells.get(&CellRef::new(row, col)))
                            .map(CellValue::display)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    async fn write_cell(&self, sheet: &str, cell: CellRef, value: CellValue) -> IngestResult<()> {
        let mut sheets = self.sheets.write().await;
        sheets.entry(sheet.to_string()).or_default().set(cell, value);
        Ok(())
    }

    async fn batch_write(&self, sheet: &str, writes: &[(CellRef, CellValue)]) -> IngestResult<()> {
        let mut sheets = self.sheets.write().await;
        let ws = sheets.entry(sheet.to_string()).or_default();
        for (cell, value) in writes {
            ws.set(*cell, value.clone());
        }
        Ok(())
    }

    async fn batch_highlight(
        &self,
        sheet: &str,
        highlights: &[(CellRef, Highlight)],
    ) -> IngestResult<()> {
        let mut sheets = self.sheets.write().await;
        let ws = sheets.entry(sheet.to_string()).or_default();
        for (cell, highlight) in highlights {
            ws.highlights.insert(*cell, *highlight);
        }
        Ok(())
    }
}

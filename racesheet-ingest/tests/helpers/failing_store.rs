//! Store wrapper whose range reads can be switched to fail

use async_trait::async_trait;
use racesheet_common::{CellRef, RangeRef};
use racesheet_ingest::error::{IngestError, IngestResult};
use racesheet_ingest::{CellValue, Highlight, MemoryStore, SheetStore};
use std::sync::atomic::{AtomicBool, Ordering};

/// Delegates to a [`MemoryStore`] until [`FailingStore::fail_reads`] is called
#[allow(dead_code)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every following `read_range` fail
    pub fn fail_reads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SheetStore for FailingStore {
    async fn read_cell(&self, sheet: &str, cell: CellRef) -> IngestResult<CellValue> {
        self.inner.read_cell(sheet, cell).await
    }

    async fn read_range(&self, sheet: &str, range: RangeRef) -> IngestResult<Vec<Vec<String>>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IngestError::Store(format!("{}!{} unavailable", sheet, range)));
        }
        self.inner.read_range(sheet, range).await
    }

    async fn write_cell(&self, sheet: &str, cell: CellRef, value: CellValue) -> IngestResult<()> {
        self.inner.write_cell(sheet, cell, value).await
    }

    async fn batch_write(&self, sheet: &str, writes: &[(CellRef, CellValue)]) -> IngestResult<()> {
        self.inner.batch_write(sheet, writes).await
    }

    async fn batch_highlight(
        &self,
        sheet: &str,
        highlights: &[(CellRef, Highlight)],
    ) -> IngestResult<()> {
        self.inner.batch_highlight(sheet, highlights).await
    }
}

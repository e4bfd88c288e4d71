//! Copy accepted rows and cells into the live document.
//!
//! Only cells whose live text differs from the incoming text are written.

use gridmerge_engine::Row;
use log::{debug, info};
use serde::Serialize;

use crate::document::LiveDocument;
use crate::error::ReconError;
use crate::locator::{Located, TargetLocator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyMode {
    /// Always insert a new row next to the located one.
    #[default]
    Insert,
    /// Overwrite the located row in place when the key matched exactly.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CopyOutcome {
    Written { row: usize, cells_written: usize, inserted: bool },
    NotFound,
}

impl CopyOutcome {
    pub fn cells_written(&self) -> usize {
        match self {
            CopyOutcome::Written { cells_written, .. } => *cells_written,
            CopyOutcome::NotFound => 0,
        }
    }
}

impl<D: LiveDocument> TargetLocator<D> {
    /// Copy `row` into the live document.
    ///
    /// Exact key match: replace in place (`Replace`) or insert before it
    /// (`Insert`). Nearest match: insert after it. Not found: nothing is
    /// written.
    pub fn copy_row(&mut self, row: &Row, suggested: usize, mode: CopyMode) -> Result<CopyOutcome, ReconError> {
        let located = self.locate(row.key(), suggested)?;
        let (target, inserted) = match (located, mode) {
            (Located::Exact(at), CopyMode::Replace) => {
                self.activate(at, 1);
                (at, false)
            }
            (Located::Exact(at), CopyMode::Insert) => {
                self.activate(at, 1);
                (self.insert_row(at, true)?, true)
            }
            (Located::Nearest(at), _) => {
                self.activate(at + 1, 1);
                (self.insert_row(at, false)?, true)
            }
            (Located::NotFound, _) => {
                info!("row '{}' not found in target, skipped", row.key());
                return Ok(CopyOutcome::NotFound);
            }
        };

        let mut written = 0;
        for cell in &row.cells {
            let column = cell.column_index + 1;
            if self.write_if_changed(target, column, &cell.value)? {
                written += 1;
            }
        }
        let key = row.key().trim();
        if !key.is_empty() {
            self.cache.insert(key, target);
        }

        debug!("copied row '{}' to {} ({} cells written)", row.key(), target, written);
        Ok(CopyOutcome::Written { row: target, cells_written: written, inserted })
    }

    /// Write one value at (row key, column header). The row key must match
    /// exactly; an approximate row is treated as not found.
    pub fn copy_cell(
        &mut self,
        row_header: &str,
        column_header: &str,
        value: &str,
        suggested_row: usize,
        suggested_column: usize,
    ) -> Result<CopyOutcome, ReconError> {
        let row = self.locate(row_header, suggested_row)?;
        let column = self.locate_column(column_header, suggested_column)?;
        let (Located::Exact(row), Located::Exact(column)) = (row, column) else {
            info!("cell '{}':'{}' not found in target", row_header, column_header);
            return Ok(CopyOutcome::NotFound);
        };
        let written = usize::from(self.write_if_changed(row, column, value)?);
        Ok(CopyOutcome::Written { row, cells_written: written, inserted: false })
    }

    /// Locate a cell and move the live cursor there. Approximate rows are
    /// accepted.
    pub fn select_target_cell(
        &mut self,
        row_header: &str,
        column_header: &str,
        suggested_row: usize,
        suggested_column: usize,
    ) -> Result<Option<(usize, usize)>, ReconError> {
        let row = self.locate(row_header, suggested_row)?;
        let column = self.locate_column(column_header, suggested_column)?;
        match (row.index(), column.index()) {
            (Some(r), Some(c)) => {
                self.activate(r, c);
                Ok(Some((r, c)))
            }
            _ => Ok(None),
        }
    }

    fn insert_row(&mut self, at: usize, before: bool) -> Result<usize, ReconError> {
        let new_row = self.document.insert_row(at, before)?;
        self.cache.shift_from(new_row);
        Ok(new_row)
    }

    fn write_if_changed(&mut self, row: usize, column: usize, value: &str) -> Result<bool, ReconError> {
        let live = self.document.read_cell(row, column)?.unwrap_or_default();
        if live == value {
            return Ok(false);
        }
        self.document.write_cell(row, column, value)?;
        Ok(true)
    }
}

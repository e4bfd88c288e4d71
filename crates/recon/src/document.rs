//! Capability surface of a live target document.
//!
//! Rows and columns are 1-based. Every call may be an expensive
//! out-of-process round trip, so callers keep the number of calls small.

use crate::error::ReconError;

pub trait LiveDocument {
    /// Rendered text of a cell, or `None` outside the document.
    fn read_cell(&self, row: usize, column: usize) -> Result<Option<String>, ReconError>;

    fn write_cell(&mut self, row: usize, column: usize, text: &str) -> Result<(), ReconError>;

    /// Insert an empty row at `at` (`before`) or after it, shifting the rows
    /// below down. Returns the index of the new row.
    fn insert_row(&mut self, at: usize, before: bool) -> Result<usize, ReconError>;

    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn activate_cell(&mut self, row: usize, column: usize) -> Result<(), ReconError>;

    /// Release the document. Called once when a session ends.
    fn close(&mut self) -> Result<(), ReconError> {
        Ok(())
    }

    /// Trimmed text of the row key cell (column 1).
    fn read_row_header(&self, row: usize) -> Result<String, ReconError> {
        Ok(self.read_cell(row, 1)?.unwrap_or_default().trim().to_string())
    }

    /// Trimmed text of the column header cell (row 1).
    fn read_column_header(&self, column: usize) -> Result<String, ReconError> {
        Ok(self.read_cell(1, column)?.unwrap_or_default().trim().to_string())
    }
}

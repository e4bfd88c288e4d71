use serde::Serialize;

use crate::sequence::DiffStatus;
use crate::sheet_diff::RowDiff;

/// Aggregate counts over a row-level diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub modified_cells: usize,
    pub modified_rows: usize,
    pub added_rows: usize,
    pub removed_rows: usize,
}

impl DiffSummary {
    /// Single pass over the rows.
    pub fn from_rows(rows: &[RowDiff]) -> Self {
        let mut summary = DiffSummary::default();
        for row in rows {
            match row.status() {
                DiffStatus::Modified => {
                    summary.modified_rows += 1;
                    summary.modified_cells +=
                        row.cells.iter().filter(|c| c.status == DiffStatus::Modified).count();
                }
                DiffStatus::Inserted => summary.added_rows += 1,
                DiffStatus::Deleted => summary.removed_rows += 1,
                DiffStatus::Equal => {}
            }
        }
        summary
    }

    pub fn has_diff(&self) -> bool {
        self.modified_rows + self.added_rows + self.removed_rows > 0
    }

    pub fn changed_rows(&self) -> usize {
        self.modified_rows + self.added_rows + self.removed_rows
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} modified cells in {} rows, {} added rows, {} removed rows",
            self.modified_cells, self.modified_rows, self.added_rows, self.removed_rows
        )
    }
}

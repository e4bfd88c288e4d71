// File-backed live document for reconciliation against a CSV/TSV target

use std::path::{Path, PathBuf};

use gridmerge_engine::Row;
use gridmerge_recon::{LiveDocument, ReconError};
use log::{debug, info};

use crate::csv::{read_grid, write_grid};

/// A CSV file held in memory while a session edits it. Saved on close when
/// anything changed.
#[derive(Debug)]
pub struct CsvDocument {
    path: PathBuf,
    delimiter: u8,
    grid: Vec<Vec<String>>,
    mutations: usize,
    active: Option<(usize, usize)>,
    read_only: bool,
}

impl CsvDocument {
    pub fn open(path: &Path) -> Result<Self, String> {
        let (grid, delimiter) = read_grid(path)?;
        info!("opened target {} ({} rows)", path.display(), grid.len());
        Ok(Self {
            path: path.to_path_buf(),
            delimiter,
            grid,
            mutations: 0,
            active: None,
            read_only: false,
        })
    }

    /// Writes are counted but never saved.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of cell writes and row inserts since opening.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn active_cell(&self) -> Option<(usize, usize)> {
        self.active
    }

    /// Current content as diff rows (0-based indices).
    pub fn rows(&self) -> Vec<Row> {
        self.grid
            .iter()
            .enumerate()
            .map(|(i, values)| Row::from_values(i, values))
            .collect()
    }

    pub fn save(&self) -> Result<(), ReconError> {
        write_grid(&self.path, &self.grid, self.delimiter).map_err(ReconError::Io)?;
        debug!("saved {} ({} mutations)", self.path.display(), self.mutations);
        Ok(())
    }

    fn in_rows(&self, row: usize) -> bool {
        row >= 1 && row <= self.grid.len()
    }
}

impl LiveDocument for CsvDocument {
    fn read_cell(&self, row: usize, column: usize) -> Result<Option<String>, ReconError> {
        if !self.in_rows(row) || column < 1 || column > self.column_count() {
            return Ok(None);
        }
        let text = self.grid[row - 1].get(column - 1).cloned().unwrap_or_default();
        Ok(Some(text))
    }

    fn write_cell(&mut self, row: usize, column: usize, text: &str) -> Result<(), ReconError> {
        if !self.in_rows(row) || column < 1 {
            return Err(ReconError::OutOfRange { row, column });
        }
        let cells = &mut self.grid[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = text.to_string();
        self.mutations += 1;
        Ok(())
    }

    fn insert_row(&mut self, at: usize, before: bool) -> Result<usize, ReconError> {
        let index = if before { at } else { at + 1 };
        if index < 1 || index > self.grid.len() + 1 {
            return Err(ReconError::OutOfRange { row: index, column: 1 });
        }
        self.grid.insert(index - 1, Vec::new());
        self.mutations += 1;
        Ok(index)
    }

    fn row_count(&self) -> usize {
        self.grid.len()
    }

    fn column_count(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn activate_cell(&mut self, row: usize, column: usize) -> Result<(), ReconError> {
        if !self.in_rows(row) || column < 1 || column > self.column_count().max(1) {
            return Err(ReconError::OutOfRange { row, column });
        }
        self.active = Some((row, column));
        Ok(())
    }

    fn close(&mut self) -> Result<(), ReconError> {
        if self.mutations > 0 && !self.read_only {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmerge_recon::{CopyMode, CopyOutcome, Located, LocatorLimits, ReconcileSession};
    use std::fs;
    use tempfile::tempdir;

    fn target(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("target.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_are_one_based() {
        let (_dir, path) = target("id,v\n1,a\n");
        let doc = CsvDocument::open(&path).unwrap();
        assert_eq!(doc.read_cell(1, 1).unwrap().as_deref(), Some("id"));
        assert_eq!(doc.read_cell(2, 2).unwrap().as_deref(), Some("a"));
        assert_eq!(doc.read_cell(3, 1).unwrap(), None);
        assert_eq!(doc.read_cell(0, 1).unwrap(), None);
        assert_eq!(doc.row_count(), 2);
        assert_eq!(doc.column_count(), 2);
    }

    #[test]
    fn out_of_range_activation_fails() {
        let (_dir, path) = target("id,v\n");
        let mut doc = CsvDocument::open(&path).unwrap();
        assert!(doc.activate_cell(1, 2).is_ok());
        assert_eq!(doc.active_cell(), Some((1, 2)));
        assert!(matches!(doc.activate_cell(9, 1), Err(ReconError::OutOfRange { .. })));
    }

    #[test]
    fn session_saves_changes_on_finish() {
        let (_dir, path) = target("id,v\n1,a\n2,b\n");
        let doc = CsvDocument::open(&path).unwrap();
        let seed = doc.rows();
        let mut session = ReconcileSession::open_seeded(doc, &seed, LocatorLimits::default());

        let row = Row::from_values(0, &["2", "B"]);
        let outcome = session.locator().unwrap().copy_row(&row, 3, CopyMode::Replace).unwrap();
        assert_eq!(outcome, CopyOutcome::Written { row: 3, cells_written: 1, inserted: false });

        let doc = session.finish().unwrap();
        assert_eq!(doc.mutations(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,v\n1,a\n2,B\n");
    }

    #[test]
    fn untouched_document_is_not_rewritten() {
        let (_dir, path) = target("id;v\n1;a\n");
        let doc = CsvDocument::open(&path).unwrap();
        let mut session = ReconcileSession::open(doc, Default::default(), LocatorLimits::default());
        assert_eq!(session.locator().unwrap().locate("1", 2).unwrap(), Located::Exact(2));
        drop(session);
        assert_eq!(fs::read_to_string(&path).unwrap(), "id;v\n1;a\n");
    }

    #[test]
    fn read_only_document_keeps_file() {
        let (_dir, path) = target("id,v\n1,a\n");
        let mut doc = CsvDocument::open(&path).unwrap().read_only();
        doc.write_cell(2, 2, "z").unwrap();
        doc.close().unwrap();
        assert_eq!(doc.mutations(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,v\n1,a\n");
    }

    #[test]
    fn inserted_rows_are_saved_in_place() {
        let (_dir, path) = target("id,v\n1,a\n3,c\n");
        let mut doc = CsvDocument::open(&path).unwrap();
        let new_row = doc.insert_row(2, false).unwrap();
        assert_eq!(new_row, 3);
        doc.write_cell(3, 1, "2").unwrap();
        doc.write_cell(3, 2, "b").unwrap();
        doc.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,v\n1,a\n2,b\n3,c\n");
    }
}

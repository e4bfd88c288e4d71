//! Directional navigation over a computed sheet diff.
//!
//! Positions are `(row, column)` pairs into `SheetDiff::rows`. Scans walk
//! outward from the given position and stop at the first hit, so cost is
//! proportional to the distance scanned. There is no wraparound.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::sequence::DiffStatus;
use crate::sheet_diff::{CellDiff, SheetDiff, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellAddress {
    pub row: usize,
    pub column: usize,
}

impl CellAddress {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Row/cell kinds the index can jump between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    ModifiedCell,
    ModifiedRow,
    AddedRow,
    RemovedRow,
}

// ---------------------------------------------------------------------------
// Search queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    EmptyPattern,
    InvalidPattern { pattern: String, message: String },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::EmptyPattern => write!(f, "search pattern is empty"),
            SearchError::InvalidPattern { pattern, message } => {
                write!(f, "invalid regular expression '{}': {}", pattern, message)
            }
        }
    }
}

impl std::error::Error for SearchError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    pub text: String,
    pub exact_match: bool,
    pub case_sensitive: bool,
    pub use_regex: bool,
    /// Only consider cells of rows that are not `Equal`.
    pub diff_only: bool,
}

impl MatchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    /// Validate and compile the query. Fails before any cell is scanned.
    pub fn compile(&self) -> Result<Matcher, SearchError> {
        if self.text.is_empty() {
            return Err(SearchError::EmptyPattern);
        }
        if self.use_regex {
            let pattern = if self.exact_match {
                format!("^(?:{})$", self.text)
            } else {
                self.text.clone()
            };
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(!self.case_sensitive)
                .build()
                .map_err(|e| SearchError::InvalidPattern {
                    pattern: self.text.clone(),
                    message: e.to_string(),
                })?;
            return Ok(Matcher::Regex(regex));
        }
        let needle = if self.case_sensitive {
            self.text.clone()
        } else {
            self.text.to_lowercase()
        };
        Ok(Matcher::Plain {
            needle,
            exact: self.exact_match,
            case_sensitive: self.case_sensitive,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Regex(Regex),
    Plain { needle: String, exact: bool, case_sensitive: bool },
}

impl Matcher {
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(text),
            Matcher::Plain { needle, exact, case_sensitive } => {
                let lowered;
                let hay = if *case_sensitive {
                    text
                } else {
                    lowered = text.to_lowercase();
                    lowered.as_str()
                };
                if *exact {
                    hay == needle
                } else {
                    hay.contains(needle.as_str())
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Cursor over one side of a diff.
#[derive(Debug, Clone)]
pub struct DiffIndex<'a> {
    diff: &'a SheetDiff,
    side: Side,
    current: Option<CellAddress>,
}

impl<'a> DiffIndex<'a> {
    pub fn new(diff: &'a SheetDiff, side: Side) -> Self {
        Self { diff, side, current: None }
    }

    pub fn diff(&self) -> &'a SheetDiff {
        self.diff
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn current(&self) -> Option<CellAddress> {
        self.current
    }

    pub fn set_current(&mut self, position: Option<CellAddress>) {
        self.current = position;
    }

    fn width(&self) -> usize {
        self.diff.column_count.max(1)
    }

    fn cell_count(&self) -> usize {
        self.diff.len() * self.width()
    }

    fn linear(&self, at: CellAddress) -> usize {
        at.row * self.width() + at.column.min(self.width() - 1)
    }

    fn address(&self, linear: usize) -> CellAddress {
        CellAddress::new(linear / self.width(), linear % self.width())
    }

    fn cell_at(&self, linear: usize) -> Option<&'a CellDiff> {
        let at = self.address(linear);
        self.diff.cell(at.row, at.column)
    }

    /// Walk cells from `from` (exclusive) or the origin (inclusive) and return
    /// the first one accepted by `pred`.
    fn scan_cells(
        &self,
        from: Option<CellAddress>,
        direction: Direction,
        mut pred: impl FnMut(usize, &CellDiff) -> bool,
    ) -> Option<CellAddress> {
        let total = self.cell_count();
        let width = self.width();
        let hit = |p: usize| {
            self.cell_at(p)
                .filter(|cell| pred(p / width, *cell))
                .map(|_| self.address(p))
        };
        match (direction, from) {
            (Direction::Next, None) => (0..total).find_map(hit),
            (Direction::Next, Some(at)) => (self.linear(at) + 1..total).find_map(hit),
            (Direction::Previous, None) => (0..total.min(1)).find_map(hit),
            (Direction::Previous, Some(at)) => {
                (0..self.linear(at).min(total)).rev().find_map(hit)
            }
        }
    }

    fn scan_rows(
        &self,
        from: Option<CellAddress>,
        direction: Direction,
        status: DiffStatus,
    ) -> Option<CellAddress> {
        let column = from.map(|a| a.column).unwrap_or(0);
        let matches = |r: &usize| self.diff.rows[*r].status() == status;
        let row = match (direction, from) {
            (Direction::Next, None) => (0..self.diff.len()).find(matches),
            (Direction::Next, Some(at)) => (at.row + 1..self.diff.len()).find(matches),
            (Direction::Previous, None) => (0..self.diff.len().min(1)).find(matches),
            (Direction::Previous, Some(at)) => (0..at.row.min(self.diff.len())).rev().find(matches),
        }?;
        Some(CellAddress::new(row, column))
    }

    pub fn find(&self, target: Target, direction: Direction, from: Option<CellAddress>) -> Option<CellAddress> {
        match target {
            Target::ModifiedCell => {
                self.scan_cells(from, direction, |_, c| c.status == DiffStatus::Modified)
            }
            Target::ModifiedRow => self.scan_rows(from, direction, DiffStatus::Modified),
            Target::AddedRow => self.scan_rows(from, direction, DiffStatus::Inserted),
            Target::RemovedRow => self.scan_rows(from, direction, DiffStatus::Deleted),
        }
    }

    pub fn next_modified_cell(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::ModifiedCell, Direction::Next, from)
    }

    pub fn previous_modified_cell(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::ModifiedCell, Direction::Previous, from)
    }

    pub fn next_modified_row(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::ModifiedRow, Direction::Next, from)
    }

    pub fn previous_modified_row(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::ModifiedRow, Direction::Previous, from)
    }

    pub fn next_added_row(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::AddedRow, Direction::Next, from)
    }

    pub fn previous_added_row(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::AddedRow, Direction::Previous, from)
    }

    pub fn next_removed_row(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::RemovedRow, Direction::Next, from)
    }

    pub fn previous_removed_row(&self, from: Option<CellAddress>) -> Option<CellAddress> {
        self.find(Target::RemovedRow, Direction::Previous, from)
    }

    pub fn next_match_cell(
        &self,
        from: Option<CellAddress>,
        query: &MatchQuery,
    ) -> Result<Option<CellAddress>, SearchError> {
        self.match_cell(from, query, Direction::Next)
    }

    pub fn previous_match_cell(
        &self,
        from: Option<CellAddress>,
        query: &MatchQuery,
    ) -> Result<Option<CellAddress>, SearchError> {
        self.match_cell(from, query, Direction::Previous)
    }

    fn match_cell(
        &self,
        from: Option<CellAddress>,
        query: &MatchQuery,
        direction: Direction,
    ) -> Result<Option<CellAddress>, SearchError> {
        let matcher = query.compile()?;
        let side = self.side;
        let rows = &self.diff.rows;
        Ok(self.scan_cells(from, direction, |row, cell| {
            if query.diff_only && rows[row].status() == DiffStatus::Equal {
                return false;
            }
            cell.text(side).is_some_and(|t| matcher.is_match(t))
        }))
    }

    /// Every match of `query`, in the order repeated stepping would visit
    /// them.
    pub fn match_all(&self, query: &MatchQuery, direction: Direction) -> Result<Vec<CellAddress>, SearchError> {
        let mut found = Vec::new();
        let mut at = None;
        while let Some(next) = self.match_cell(at, query, Direction::Next)? {
            found.push(next);
            at = Some(next);
        }
        if direction == Direction::Previous {
            found.reverse();
        }
        Ok(found)
    }

    // -----------------------------------------------------------------------
    // Cursor movement
    // -----------------------------------------------------------------------

    /// Jump from the current position; the cursor only moves on a hit.
    pub fn step(&mut self, target: Target, direction: Direction) -> Option<CellAddress> {
        let found = self.find(target, direction, self.current)?;
        self.current = Some(found);
        Some(found)
    }

    pub fn step_match(
        &mut self,
        query: &MatchQuery,
        direction: Direction,
    ) -> Result<Option<CellAddress>, SearchError> {
        let found = self.match_cell(self.current, query, direction)?;
        if let Some(at) = found {
            self.current = Some(at);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::sheet_diff::{diff_sheets, DiffConfig};

    fn sample() -> SheetDiff {
        let rows = |d: &[&[&str]]| -> Vec<Row> {
            d.iter().enumerate().map(|(i, v)| Row::from_values(i, v)).collect()
        };
        let left = rows(&[&["1", "x", "a"], &["2", "y", "b"], &["3", "z", "c"], &["5", "q", "e"]]);
        let right = rows(&[&["1", "x", "a"], &["2", "Y", "B"], &["4", "w", "d"], &["5", "q", "E"]]);
        diff_sheets(&left, &right, &DiffConfig::default())
    }

    // Rows: 0 Equal, 1 Modified(1,2), 2 Deleted "3", 3 Inserted "4", 4 Modified(2)

    #[test]
    fn modified_cells_forward_and_back() {
        let diff = sample();
        let idx = DiffIndex::new(&diff, Side::Left);
        let first = idx.next_modified_cell(None).unwrap();
        assert_eq!(first, CellAddress::new(1, 1));
        let second = idx.next_modified_cell(Some(first)).unwrap();
        assert_eq!(second, CellAddress::new(1, 2));
        let third = idx.next_modified_cell(Some(second)).unwrap();
        assert_eq!(third, CellAddress::new(4, 2));
        assert_eq!(idx.next_modified_cell(Some(third)), None);
        assert_eq!(idx.previous_modified_cell(Some(third)), Some(second));
        assert_eq!(idx.previous_modified_cell(Some(first)), None);
    }

    #[test]
    fn row_navigation_keeps_column() {
        let diff = sample();
        let idx = DiffIndex::new(&diff, Side::Left);
        let at = CellAddress::new(0, 2);
        assert_eq!(idx.next_removed_row(Some(at)), Some(CellAddress::new(2, 2)));
        assert_eq!(idx.next_added_row(Some(at)), Some(CellAddress::new(3, 2)));
        assert_eq!(idx.next_modified_row(Some(CellAddress::new(1, 0))), Some(CellAddress::new(4, 0)));
        assert_eq!(idx.previous_modified_row(Some(CellAddress::new(4, 0))), Some(CellAddress::new(1, 0)));
        assert_eq!(idx.previous_added_row(Some(CellAddress::new(3, 0))), None);
        assert_eq!(idx.next_added_row(None), Some(CellAddress::new(3, 0)));
    }

    #[test]
    fn unset_position_starts_at_origin() {
        let diff = sample();
        let idx = DiffIndex::new(&diff, Side::Left);
        let q = MatchQuery { exact_match: true, ..MatchQuery::new("1") };
        assert_eq!(idx.next_match_cell(None, &q).unwrap(), Some(CellAddress::new(0, 0)));
        assert_eq!(idx.previous_match_cell(None, &q).unwrap(), Some(CellAddress::new(0, 0)));
        assert_eq!(idx.previous_modified_cell(None), None);
    }

    #[test]
    fn match_modes() {
        let diff = sample();
        let left = DiffIndex::new(&diff, Side::Left);
        let right = DiffIndex::new(&diff, Side::Right);

        let plain = MatchQuery::new("Y");
        assert_eq!(left.next_match_cell(None, &plain).unwrap(), Some(CellAddress::new(1, 1)));

        let sensitive = MatchQuery { case_sensitive: true, ..MatchQuery::new("Y") };
        assert_eq!(left.next_match_cell(None, &sensitive).unwrap(), None);
        assert_eq!(right.next_match_cell(None, &sensitive).unwrap(), Some(CellAddress::new(1, 1)));

        let regex = MatchQuery { use_regex: true, ..MatchQuery::new("^[de]$") };
        assert_eq!(right.next_match_cell(None, &regex).unwrap(), Some(CellAddress::new(3, 2)));

        let exact = MatchQuery { exact_match: true, ..MatchQuery::new("x") };
        assert_eq!(left.next_match_cell(None, &exact).unwrap(), Some(CellAddress::new(0, 1)));
    }

    #[test]
    fn diff_only_skips_equal_rows() {
        let diff = sample();
        let idx = DiffIndex::new(&diff, Side::Left);
        let q = MatchQuery { diff_only: true, ..MatchQuery::new("x") };
        assert_eq!(idx.next_match_cell(None, &q).unwrap(), None);
        let q = MatchQuery { diff_only: true, ..MatchQuery::new("z") };
        assert_eq!(idx.next_match_cell(None, &q).unwrap(), Some(CellAddress::new(2, 1)));
    }

    #[test]
    fn deleted_rows_have_no_right_text() {
        let diff = sample();
        let idx = DiffIndex::new(&diff, Side::Right);
        let q = MatchQuery::new("z");
        assert_eq!(idx.next_match_cell(None, &q).unwrap(), None);
    }

    #[test]
    fn invalid_regex_is_reported_before_scanning() {
        let diff = sample();
        let idx = DiffIndex::new(&diff, Side::Left);
        let q = MatchQuery { use_regex: true, ..MatchQuery::new("(unclosed") };
        assert!(matches!(idx.next_match_cell(None, &q), Err(SearchError::InvalidPattern { .. })));
        assert_eq!(idx.next_match_cell(None, &MatchQuery::new("")), Err(SearchError::EmptyPattern));
    }

    #[test]
    fn stepping_moves_cursor_only_on_hit() {
        let diff = sample();
        let mut idx = DiffIndex::new(&diff, Side::Left);
        assert_eq!(idx.step(Target::RemovedRow, Direction::Next), Some(CellAddress::new(2, 0)));
        assert_eq!(idx.current(), Some(CellAddress::new(2, 0)));
        assert_eq!(idx.step(Target::RemovedRow, Direction::Next), None);
        assert_eq!(idx.current(), Some(CellAddress::new(2, 0)));
    }

    #[test]
    fn match_all_walks_in_order() {
        let diff = sample();
        let idx = DiffIndex::new(&diff, Side::Right);
        let q = MatchQuery { use_regex: true, exact_match: true, ..MatchQuery::new("[a-e]") };
        let hits = idx.match_all(&q, Direction::Next).unwrap();
        assert_eq!(
            hits,
            vec![CellAddress::new(0, 2), CellAddress::new(1, 2), CellAddress::new(3, 2), CellAddress::new(4, 2)]
        );
        let back = idx.match_all(&q, Direction::Previous).unwrap();
        let mut reversed = hits.clone();
        reversed.reverse();
        assert_eq!(back, reversed);
    }

    #[test]
    fn empty_diff_finds_nothing() {
        let diff = diff_sheets(&[], &[], &DiffConfig::default());
        let idx = DiffIndex::new(&diff, Side::Left);
        assert_eq!(idx.next_modified_cell(None), None);
        assert_eq!(idx.next_added_row(None), None);
        assert_eq!(idx.next_match_cell(None, &MatchQuery::new("a")).unwrap(), None);
    }
}

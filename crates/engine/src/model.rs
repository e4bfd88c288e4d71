// Row and cell values plus the equality policies used by the diff.
//
// Only the rendered text of a cell is kept. Rows compare either on every cell
// (`Full`) or on the leading key cell (`KeyOnly`).

use std::collections::BTreeSet;
use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Seed and multiplier of the folded row hash.
const HASH_SEED: u64 = 7;
const HASH_FACTOR: u64 = 13;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub value: String,
    pub column_index: usize,
    pub row_index: usize,
}

impl Cell {
    pub fn new(value: impl Into<String>, column_index: usize, row_index: usize) -> Self {
        Self { value: value.into(), column_index, row_index }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// How two rows decide whether they are "the same row".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Every cell value, in order.
    Full,
    /// Only the first cell (the row key).
    #[default]
    KeyOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub index: usize,
    pub cells: Vec<Cell>,
    #[serde(skip)]
    pub mode: CompareMode,
}

impl Row {
    pub fn new(index: usize, cells: Vec<Cell>) -> Self {
        Self { index, cells, mode: CompareMode::Full }
    }

    /// Build a row from plain values; column indices follow position.
    pub fn from_values<S: AsRef<str>>(index: usize, values: &[S]) -> Self {
        let cells = values
            .iter()
            .enumerate()
            .map(|(col, v)| Cell::new(v.as_ref(), col, index))
            .collect();
        Self::new(index, cells)
    }

    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Value at a column; missing cells read as empty text.
    pub fn value(&self, column: usize) -> &str {
        self.cells.get(column).map(|c| c.value.as_str()).unwrap_or("")
    }

    /// Leading key cell value.
    pub fn key(&self) -> &str {
        self.value(0)
    }

    pub fn values(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.value.clone()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.value.is_empty())
    }

    /// Extend with empty cells up to `width` columns.
    pub fn pad_to(&mut self, width: usize) {
        for col in self.cells.len()..width {
            self.cells.push(Cell::new("", col, self.index));
        }
    }

    /// Deterministic fold over every cell value: `h = h * 13 + hash(cell)`.
    pub fn combined_hash(&self) -> u64 {
        fold_hash(self.cells.iter().map(|c| c.value.as_str()))
    }

    /// Structural comparison of every cell, padding the shorter row with
    /// empty values.
    pub fn content_eq(&self, other: &Row) -> bool {
        let width = self.len().max(other.len());
        (0..width).all(|col| self.value(col) == other.value(col))
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        match self.mode {
            CompareMode::KeyOnly => self.key() == other.key(),
            CompareMode::Full => self.content_eq(other),
        }
    }
}

pub fn cell_hash(value: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(value.as_bytes());
    hasher.finish()
}

fn fold_hash<'a>(values: impl Iterator<Item = &'a str>) -> u64 {
    values.fold(HASH_SEED, |hash, v| {
        hash.wrapping_mul(HASH_FACTOR).wrapping_add(cell_hash(v))
    })
}

/// Equality policy applied by the row-level diff.
pub trait RowEquality {
    fn equals(&self, left: &Row, right: &Row) -> bool;
    fn hash(&self, row: &Row) -> u64;
}

/// Full-row comparer that skips ignored columns.
///
/// Equality is decided by the folded hash alone, so two distinct rows whose
/// hashes collide compare equal. Callers that need a structural answer use
/// [`Row::content_eq`].
#[derive(Debug, Clone, Default)]
pub struct RowComparer {
    pub ignored_columns: BTreeSet<usize>,
}

impl RowComparer {
    pub fn new(ignored_columns: BTreeSet<usize>) -> Self {
        Self { ignored_columns }
    }

    pub fn is_ignored(&self, column: usize) -> bool {
        self.ignored_columns.contains(&column)
    }
}

impl RowEquality for RowComparer {
    fn equals(&self, left: &Row, right: &Row) -> bool {
        self.hash(left) == self.hash(right)
    }

    fn hash(&self, row: &Row) -> u64 {
        fold_hash(
            row.cells
                .iter()
                .enumerate()
                .filter(|(col, _)| !self.is_ignored(*col))
                .map(|(_, c)| c.value.as_str()),
        )
    }
}

/// Key comparer: rows match when their first cell text matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowKeyComparer;

impl RowEquality for RowKeyComparer {
    fn equals(&self, left: &Row, right: &Row) -> bool {
        match (left.cells.first(), right.cells.first()) {
            (Some(l), Some(r)) => l.value == r.value,
            (None, None) => true,
            _ => false,
        }
    }

    fn hash(&self, row: &Row) -> u64 {
        row.cells.first().map(|c| cell_hash(&c.value)).unwrap_or(u64::MAX)
    }
}

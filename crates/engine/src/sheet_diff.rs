//! Row-level sheet diff with per-cell classification.
//!
//! Rows are trimmed and padded to a common width, aligned with the sequence
//! differ, then every aligned row pair is classified cell by cell. Modified
//! cells carry a line/character refinement of their values.

use std::cell::OnceCell;
use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::model::{Cell, CompareMode, Row, RowComparer, RowEquality, RowKeyComparer};
use crate::progress::{exceeds_size_limit, NoProgress, Phase, ProgressEvent, ProgressSink};
use crate::sequence::{edit_script, materialize, order_delete_first, pair_modified, DiffResult, DiffStatus};
use crate::summary::DiffSummary;
use crate::text_diff::{diff_value, ValueDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiffConfig {
    /// `Row::index` of each side's column-header row.
    pub left_header_index: Option<usize>,
    pub right_header_index: Option<usize>,
    pub trim_leading_blank_rows: bool,
    pub trim_leading_blank_columns: bool,
    pub trim_trailing_blank_rows: bool,
    pub trim_trailing_blank_columns: bool,
    pub ignored_columns: BTreeSet<usize>,
    pub row_matching: CompareMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDiff {
    pub column: usize,
    pub left: Option<String>,
    pub right: Option<String>,
    pub status: DiffStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ValueDiff>,
}

impl CellDiff {
    pub fn text(&self, side: Side) -> Option<&str> {
        match side {
            Side::Left => self.left.as_deref(),
            Side::Right => self.right.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowDiff {
    #[serde(flatten)]
    pub result: DiffResult<Row>,
    pub cells: Vec<CellDiff>,
}

impl RowDiff {
    pub fn status(&self) -> DiffStatus {
        self.result.status
    }

    pub fn row(&self, side: Side) -> Option<&Row> {
        match side {
            Side::Left => self.result.left.as_ref(),
            Side::Right => self.result.right.as_ref(),
        }
    }

    /// Key text of the row, taken from the left side unless it is empty there.
    pub fn header_text(&self) -> &str {
        let left = self.result.left.as_ref().map(Row::key).unwrap_or("");
        if !left.is_empty() {
            return left;
        }
        self.result.right.as_ref().map(Row::key).unwrap_or("")
    }

    pub fn cell(&self, column: usize) -> Option<&CellDiff> {
        self.cells.get(column)
    }
}

/// Result of one diff run. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct SheetDiff {
    pub rows: Vec<RowDiff>,
    pub column_count: usize,
    /// Position in `rows` of each side's header row, when present.
    pub left_header: Option<usize>,
    pub right_header: Option<usize>,
    #[serde(skip)]
    summary: OnceCell<DiffSummary>,
}

impl SheetDiff {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, position: usize) -> Option<&RowDiff> {
        self.rows.get(position)
    }

    pub fn cell(&self, position: usize, column: usize) -> Option<&CellDiff> {
        self.rows.get(position).and_then(|r| r.cell(column))
    }

    /// Summary counts; computed on first use.
    pub fn create_summary(&self) -> DiffSummary {
        *self.summary.get_or_init(|| DiffSummary::from_rows(&self.rows))
    }

    pub fn has_diff(&self) -> bool {
        self.create_summary().has_diff()
    }

    pub fn is_header(&self, position: usize) -> bool {
        self.left_header == Some(position) || self.right_header == Some(position)
    }

    pub fn row_header_text(&self, position: usize) -> &str {
        self.rows.get(position).map(RowDiff::header_text).unwrap_or("")
    }

    /// Column header text, left header row first, right as fallback.
    pub fn column_header_text(&self, column: usize) -> &str {
        let from = |pos: Option<usize>, side: Side| {
            pos.and_then(|p| self.rows.get(p))
                .and_then(|r| r.row(side))
                .map(|r| r.value(column))
                .unwrap_or("")
        };
        let left = from(self.left_header, Side::Left);
        if !left.is_empty() {
            return left;
        }
        from(self.right_header, Side::Right)
    }

    /// Header texts of every column, for column-by-name lookups.
    pub fn column_headers(&self) -> Vec<String> {
        (0..self.column_count).map(|c| self.column_header_text(c).to_string()).collect()
    }

    pub fn positions_with_status(&self, status: DiffStatus) -> impl Iterator<Item = usize> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.status() == status)
            .map(|(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// Diff entry points
// ---------------------------------------------------------------------------

pub fn diff_sheets(left: &[Row], right: &[Row], config: &DiffConfig) -> SheetDiff {
    diff_sheets_with_progress(left, right, config, &NoProgress)
}

pub fn diff_sheets_with_progress(
    left: &[Row],
    right: &[Row],
    config: &DiffConfig,
    progress: &dyn ProgressSink,
) -> SheetDiff {
    if exceeds_size_limit(left.len(), right.len()) {
        warn!(
            "large sheet diff: {} left rows, {} right rows",
            left.len(),
            right.len()
        );
        progress.report(ProgressEvent::SizeWarning {
            left_rows: left.len(),
            right_rows: right.len(),
        });
    }
    progress.report(ProgressEvent::Phase(Phase::ExtractingDiff));
    info!("{}: {} x {} rows", Phase::ExtractingDiff.label(), left.len(), right.len());

    let mut left = prepare_side(left, config);
    let mut right = prepare_side(right, config);

    let width = left
        .iter()
        .chain(right.iter())
        .map(Row::len)
        .max()
        .unwrap_or(0);
    for row in left.iter_mut().chain(right.iter_mut()) {
        row.pad_to(width);
        row.mode = config.row_matching;
    }

    let comparer = RowComparer::new(config.ignored_columns.clone());
    let aligned = align_rows(&left, &right, config.row_matching, &comparer);

    let rows: Vec<RowDiff> = aligned
        .into_iter()
        .map(|result| classify_row(result, width, &comparer))
        .collect();

    let left_header = header_position(&rows, config.left_header_index, Side::Left);
    let right_header = header_position(&rows, config.right_header_index, Side::Right);

    debug!("sheet diff produced {} rows over {} columns", rows.len(), width);

    SheetDiff {
        rows,
        column_count: width,
        left_header,
        right_header,
        summary: OnceCell::new(),
    }
}

fn align_rows(
    left: &[Row],
    right: &[Row],
    mode: CompareMode,
    comparer: &RowComparer,
) -> Vec<DiffResult<Row>> {
    match mode {
        CompareMode::KeyOnly => {
            let script = edit_script(left.len(), right.len(), |i, j| {
                RowKeyComparer.equals(&left[i], &right[j])
            });
            order_delete_first(materialize(&script, left, right))
        }
        CompareMode::Full => {
            let lh: Vec<u64> = left.iter().map(|r| comparer.hash(r)).collect();
            let rh: Vec<u64> = right.iter().map(|r| comparer.hash(r)).collect();
            let script = edit_script(left.len(), right.len(), |i, j| lh[i] == rh[j]);
            pair_modified(order_delete_first(materialize(&script, left, right)))
        }
    }
}

fn classify_row(mut result: DiffResult<Row>, width: usize, comparer: &RowComparer) -> RowDiff {
    let cells = match (&result.left, &result.right) {
        (Some(l), Some(r)) => {
            let cells: Vec<CellDiff> =
                (0..width).map(|col| compare_cell(l, r, col, comparer)).collect();
            let changed = cells.iter().any(|c| c.status == DiffStatus::Modified);
            result.status = if changed { DiffStatus::Modified } else { DiffStatus::Equal };
            cells
        }
        (Some(l), None) => (0..width)
            .map(|col| CellDiff {
                column: col,
                left: Some(l.value(col).to_string()),
                right: None,
                status: DiffStatus::Deleted,
                detail: None,
            })
            .collect(),
        (None, Some(r)) => (0..width)
            .map(|col| CellDiff {
                column: col,
                left: None,
                right: Some(r.value(col).to_string()),
                status: DiffStatus::Inserted,
                detail: None,
            })
            .collect(),
        (None, None) => Vec::new(),
    };
    RowDiff { result, cells }
}

fn compare_cell(left: &Row, right: &Row, column: usize, comparer: &RowComparer) -> CellDiff {
    let l = left.value(column);
    let r = right.value(column);
    let modified = l != r && !comparer.is_ignored(column);
    CellDiff {
        column,
        left: Some(l.to_string()),
        right: Some(r.to_string()),
        status: if modified { DiffStatus::Modified } else { DiffStatus::Equal },
        detail: modified.then(|| diff_value(l, r)),
    }
}

fn header_position(rows: &[RowDiff], index: Option<usize>, side: Side) -> Option<usize> {
    let index = index?;
    rows.iter().position(|r| r.row(side).is_some_and(|row| row.index == index))
}

// ---------------------------------------------------------------------------
// Trimming
// ---------------------------------------------------------------------------

fn prepare_side(rows: &[Row], config: &DiffConfig) -> Vec<Row> {
    let mut start = 0;
    let mut end = rows.len();
    if config.trim_leading_blank_rows {
        while start < end && rows[start].is_blank() {
            start += 1;
        }
    }
    if config.trim_trailing_blank_rows {
        while end > start && rows[end - 1].is_blank() {
            end -= 1;
        }
    }
    let mut out: Vec<Row> = rows[start..end].to_vec();

    let width = out.iter().map(Row::len).max().unwrap_or(0);
    let column_blank = |col: usize| out.iter().all(|r| r.value(col).is_empty());

    let mut first = 0;
    let mut last = width;
    if config.trim_leading_blank_columns {
        while first < last && column_blank(first) {
            first += 1;
        }
    }
    if config.trim_trailing_blank_columns {
        while last > first && column_blank(last - 1) {
            last -= 1;
        }
    }

    if first > 0 || last < width {
        for row in &mut out {
            let cells: Vec<Cell> = row
                .cells
                .iter()
                .skip(first)
                .take(last - first)
                .enumerate()
                .map(|(col, c)| Cell::new(c.value.clone(), col, row.index))
                .collect();
            row.cells = cells;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgress;

    fn rows(data: &[&[&str]]) -> Vec<Row> {
        data.iter().enumerate().map(|(i, v)| Row::from_values(i, v)).collect()
    }

    fn statuses(diff: &SheetDiff) -> Vec<DiffStatus> {
        diff.rows.iter().map(|r| r.status()).collect()
    }

    #[test]
    fn key_matching_scenario() {
        let left = rows(&[&["1", "x"], &["2", "y"], &["3", "z"]]);
        let right = rows(&[&["1", "x"], &["2", "Y"], &["4", "w"]]);
        let diff = diff_sheets(&left, &right, &DiffConfig::default());

        assert_eq!(
            statuses(&diff),
            vec![DiffStatus::Equal, DiffStatus::Modified, DiffStatus::Deleted, DiffStatus::Inserted]
        );
        let cell = diff.cell(1, 1).unwrap();
        assert_eq!(cell.status, DiffStatus::Modified);
        assert_eq!(cell.left.as_deref(), Some("y"));
        assert_eq!(cell.right.as_deref(), Some("Y"));
        assert!(cell.detail.is_some());
        assert_eq!(diff.cell(1, 0).unwrap().status, DiffStatus::Equal);

        let summary = diff.create_summary();
        assert_eq!(
            summary,
            DiffSummary { modified_cells: 1, modified_rows: 1, added_rows: 1, removed_rows: 1 }
        );
    }

    #[test]
    fn full_matching_pairs_changed_rows() {
        let left = rows(&[&["1", "x"], &["2", "y"], &["3", "z"]]);
        let right = rows(&[&["1", "x"], &["2", "Y"], &["3", "z"]]);
        let config = DiffConfig { row_matching: CompareMode::Full, ..Default::default() };
        let diff = diff_sheets(&left, &right, &config);
        assert_eq!(
            statuses(&diff),
            vec![DiffStatus::Equal, DiffStatus::Modified, DiffStatus::Equal]
        );
        assert_eq!(diff.create_summary().modified_cells, 1);
    }

    #[test]
    fn uneven_rows_compare_as_padded() {
        let left = rows(&[&["1", "x", ""], &["2"]]);
        let right = rows(&[&["1", "x"], &["2", "", ""]]);
        let config = DiffConfig { row_matching: CompareMode::Full, ..Default::default() };
        let diff = diff_sheets(&left, &right, &config);
        assert_eq!(statuses(&diff), vec![DiffStatus::Equal, DiffStatus::Equal]);
        assert_eq!(diff.column_count, 3);
        assert!(diff.rows.iter().all(|r| r.cells.len() == 3));
    }

    #[test]
    fn ignored_columns_never_modify() {
        let left = rows(&[&["1", "09:00", "a"]]);
        let right = rows(&[&["1", "10:30", "a"]]);
        let config = DiffConfig {
            ignored_columns: [1].into_iter().collect(),
            ..Default::default()
        };
        let diff = diff_sheets(&left, &right, &config);
        assert_eq!(statuses(&diff), vec![DiffStatus::Equal]);
        assert!(!diff.has_diff());
    }

    #[test]
    fn trimming_blank_edges() {
        let left = rows(&[&["", "", ""], &["", "k", "v"], &["", "", ""]]);
        let right = rows(&[&["k", "v"]]);
        let config = DiffConfig {
            trim_leading_blank_rows: true,
            trim_trailing_blank_rows: true,
            trim_leading_blank_columns: true,
            trim_trailing_blank_columns: true,
            ..Default::default()
        };
        let diff = diff_sheets(&left, &right, &config);
        assert_eq!(statuses(&diff), vec![DiffStatus::Equal]);
        let row = diff.rows[0].row(Side::Left).unwrap();
        assert_eq!(row.index, 1);
        assert_eq!(row.cells[0].column_index, 0);
        assert_eq!(row.value(0), "k");
    }

    #[test]
    fn header_rows_provide_column_names() {
        let left = rows(&[&["id", "name"], &["1", "a"]]);
        let right = rows(&[&["id", "label"], &["1", "b"]]);
        let config = DiffConfig {
            left_header_index: Some(0),
            right_header_index: Some(0),
            ..Default::default()
        };
        let diff = diff_sheets(&left, &right, &config);
        assert_eq!(diff.left_header, Some(0));
        assert!(diff.is_header(0));
        assert_eq!(diff.column_header_text(1), "name");
        assert_eq!(diff.column_headers(), vec!["id".to_string(), "name".to_string()]);
        assert_eq!(diff.row_header_text(1), "1");
    }

    #[test]
    fn identical_sheets_have_empty_summary() {
        let data = rows(&[&["a", "1"], &["b", "2"]]);
        let diff = diff_sheets(&data, &data, &DiffConfig::default());
        assert!(statuses(&diff).iter().all(|s| *s == DiffStatus::Equal));
        assert_eq!(diff.create_summary(), DiffSummary::default());
    }

    #[test]
    fn progress_reports_extracting_phase() {
        let progress = RecordingProgress::default();
        let data = rows(&[&["a"]]);
        diff_sheets_with_progress(&data, &data, &DiffConfig::default(), &progress);
        assert_eq!(progress.events(), vec![ProgressEvent::Phase(Phase::ExtractingDiff)]);
    }
}

//! `gmerge diff`, `gmerge log` and `gmerge find`.

use std::io::{self, Write};
use std::ops::Range;
use std::path::PathBuf;

use gridmerge_engine::changelog::{build_change_log, single_line};
use gridmerge_engine::{
    CellAddress, DiffIndex, DiffStatus, DiffSummary, Direction, MatchQuery, RowDiff, SearchError,
    SheetDiff, Side, Target,
};
use serde::Serialize;

use crate::context::RunContext;
use crate::exit_codes::{EXIT_DIFFS, EXIT_SUCCESS};
use crate::{CliError, CmdResult, DiffOptions};

// ============================================================================
// diff
// ============================================================================

#[derive(Serialize)]
struct DiffReport<'a> {
    left: String,
    right: String,
    summary: DiffSummary,
    column_headers: Vec<String>,
    rows: Vec<RowReport<'a>>,
}

#[derive(Serialize)]
struct RowReport<'a> {
    position: usize,
    status: DiffStatus,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    left_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    right_index: Option<usize>,
    cells: Vec<CellReport<'a>>,
}

#[derive(Serialize)]
struct CellReport<'a> {
    column: usize,
    header: &'a str,
    left: Option<&'a str>,
    right: Option<&'a str>,
}

fn row_report<'a>(diff: &'a SheetDiff, position: usize, row: &'a RowDiff) -> RowReport<'a> {
    let cells = row
        .cells
        .iter()
        .filter(|c| c.status == DiffStatus::Modified)
        .map(|c| CellReport {
            column: c.column,
            header: diff.column_header_text(c.column),
            left: c.left.as_deref(),
            right: c.right.as_deref(),
        })
        .collect();
    RowReport {
        position,
        status: row.status(),
        key: row.header_text(),
        left_index: row.result.left_index,
        right_index: row.result.right_index,
        cells,
    }
}

pub fn cmd_diff(
    ctx: &RunContext,
    left: Option<PathBuf>,
    right: Option<PathBuf>,
    options: &DiffOptions,
    json: bool,
    all: bool,
) -> CmdResult {
    let sides = ctx.read_sides(left, right)?;
    let diff = ctx.run_diff(&sides, options)?;
    let summary = diff.create_summary();

    let shown: Vec<RowReport<'_>> = diff
        .rows
        .iter()
        .enumerate()
        .filter(|(_, r)| all || r.status().is_change())
        .map(|(i, r)| row_report(&diff, i, r))
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let report = DiffReport {
            left: sides.left_path.display().to_string(),
            right: sides.right_path.display().to_string(),
            summary,
            column_headers: diff.column_headers(),
            rows: shown,
        };
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{}", text).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        if !summary.has_diff() && ctx.settings().notify_equal {
            writeln!(out, "no differences").map_err(|e| CliError::io(e.to_string()))?;
        } else {
            writeln!(out, "{}", summary).map_err(|e| CliError::io(e.to_string()))?;
        }
        if ctx.settings().focus_first_diff {
            if let Some(CellAddress { row, column }) = first_difference(&diff) {
                writeln!(out, "first difference at {}:{}", row, column)
                    .map_err(|e| CliError::io(e.to_string()))?;
            }
        }
        for row in &shown {
            write_row(&mut out, row).map_err(|e| CliError::io(e.to_string()))?;
        }
    }

    Ok(if summary.has_diff() { EXIT_DIFFS } else { EXIT_SUCCESS })
}

/// Earliest modified cell, added row or removed row in scan order.
fn first_difference(diff: &SheetDiff) -> Option<CellAddress> {
    let index = DiffIndex::new(diff, Side::Left);
    [Target::ModifiedCell, Target::AddedRow, Target::RemovedRow]
        .into_iter()
        .filter_map(|target| index.find(target, Direction::Next, None))
        .min_by_key(|at| (at.row, at.column))
}

fn write_row(out: &mut impl Write, row: &RowReport<'_>) -> io::Result<()> {
    writeln!(out, "{:>5}  {:<8}  {}", row.position, row.status.as_str(), single_line(row.key))?;
    for cell in &row.cells {
        let header = if cell.header.is_empty() {
            format!("#{}", cell.column)
        } else {
            single_line(cell.header)
        };
        writeln!(
            out,
            "         {}: {} -> {}",
            header,
            single_line(cell.left.unwrap_or("")),
            single_line(cell.right.unwrap_or(""))
        )?;
    }
    Ok(())
}

// ============================================================================
// log
// ============================================================================

/// Parse `A..B`; either end may be omitted.
pub fn parse_row_range(text: &str, len: usize) -> Result<Range<usize>, CliError> {
    let invalid = || {
        CliError::args(format!("invalid row range '{}'", text)).with_hint("use START..END, e.g. 10..20")
    };
    let (start, end) = text.split_once("..").ok_or_else(invalid)?;
    let start = match start.trim() {
        "" => 0,
        s => s.parse::<usize>().map_err(|_| invalid())?,
    };
    let end = match end.trim() {
        "" => len,
        s => s.parse::<usize>().map_err(|_| invalid())?,
    };
    if start > end {
        return Err(invalid());
    }
    Ok(start..end)
}

pub fn cmd_log(
    ctx: &RunContext,
    left: Option<PathBuf>,
    right: Option<PathBuf>,
    options: &DiffOptions,
    rows: Option<&str>,
) -> CmdResult {
    let sides = ctx.read_sides(left, right)?;
    let diff = ctx.run_diff(&sides, options)?;
    let range = match rows {
        Some(text) => parse_row_range(text, diff.len())?,
        None => 0..diff.len(),
    };

    let lines = build_change_log(&diff, range, &ctx.log_formats());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in &lines {
        writeln!(out, "{}", line).map_err(|e| CliError::io(e.to_string()))?;
    }

    Ok(if lines.is_empty() { EXIT_SUCCESS } else { EXIT_DIFFS })
}

// ============================================================================
// find
// ============================================================================

pub struct FindQuery {
    pub exact: bool,
    pub case_sensitive: bool,
    pub regex: bool,
    pub diff_only: bool,
    pub reverse: bool,
    pub side: Side,
}

pub fn cmd_find(ctx: &mut RunContext, args: Vec<String>, options: &DiffOptions, find: FindQuery) -> CmdResult {
    let (left, right, pattern) = match args.as_slice() {
        [pattern] => (None, None, pattern.clone()),
        [left, right, pattern] => (Some(PathBuf::from(left)), Some(PathBuf::from(right)), pattern.clone()),
        _ => {
            return Err(CliError::args("find takes PATTERN or LEFT RIGHT PATTERN"));
        }
    };

    let query = MatchQuery {
        text: pattern.clone(),
        exact_match: find.exact,
        case_sensitive: find.case_sensitive,
        use_regex: find.regex,
        diff_only: find.diff_only,
    };
    // reject a bad pattern before reading any file
    query.compile().map_err(search_error)?;
    ctx.remember_search(&pattern);

    let sides = ctx.read_sides(left, right)?;
    let diff = ctx.run_diff(&sides, options)?;
    let index = DiffIndex::new(&diff, find.side);
    let direction = if find.reverse { Direction::Previous } else { Direction::Next };
    let found = index.match_all(&query, direction).map_err(search_error)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for CellAddress { row, column } in &found {
        let text = diff.cell(*row, *column).and_then(|c| c.text(find.side)).unwrap_or("");
        writeln!(out, "{}:{}\t{}", row, column, single_line(text)).map_err(|e| CliError::io(e.to_string()))?;
    }

    Ok(EXIT_SUCCESS)
}

fn search_error(err: SearchError) -> CliError {
    let hint = match &err {
        SearchError::EmptyPattern => "give a non-empty pattern",
        SearchError::InvalidPattern { .. } => "check the regex syntax, or drop --regex for a plain search",
    };
    CliError::pattern(err.to_string()).with_hint(hint)
}

//! `gmerge locate` and `gmerge apply`: reconciliation against a target file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gridmerge_engine::{DiffStatus, Side};
use gridmerge_io::CsvDocument;
use gridmerge_recon::{CopyMode, CopyOutcome, Located, ReconcileSession};
use log::info;
use serde::Serialize;

use crate::context::RunContext;
use crate::exit_codes::{EXIT_NOT_FOUND, EXIT_SUCCESS};
use crate::{CliError, CmdResult, DiffOptions};

fn open_target(path: &Path, read_only: bool) -> Result<CsvDocument, CliError> {
    let doc = CsvDocument::open(path).map_err(CliError::io)?;
    Ok(if read_only { doc.read_only() } else { doc })
}

fn located_text(located: Located) -> String {
    match located.index() {
        Some(index) => format!("{} {}", located.status_code(), index),
        None => located.status_code().to_string(),
    }
}

// ============================================================================
// locate
// ============================================================================

pub fn cmd_locate(
    ctx: &RunContext,
    target: PathBuf,
    key: &str,
    column: Option<&str>,
    suggest: usize,
) -> CmdResult {
    let doc = open_target(&target, true)?;
    let seed = doc.rows();
    let mut session = ReconcileSession::open_seeded(doc, &seed, ctx.locator_limits());
    let locator = session.locator()?;

    let row = locator.locate(key, suggest)?;
    let column = match column {
        Some(header) => Some(locator.locate_column(header, 1)?),
        None => None,
    };
    if let (Some(r), Some(c)) = (row.index(), column.and_then(|c| c.index())) {
        locator.activate(r, c);
    }
    session.finish()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", located_text(row)).map_err(|e| CliError::io(e.to_string()))?;
    if let Some(column) = column {
        writeln!(out, "{}", located_text(column)).map_err(|e| CliError::io(e.to_string()))?;
    }

    let missing = row == Located::NotFound || column == Some(Located::NotFound);
    Ok(if missing { EXIT_NOT_FOUND } else { EXIT_SUCCESS })
}

// ============================================================================
// apply
// ============================================================================

pub struct ApplyRun {
    pub from: Side,
    pub replace: bool,
    pub dry_run: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct AppliedRow {
    position: usize,
    key: String,
    status: DiffStatus,
    #[serde(flatten)]
    outcome: CopyOutcome,
}

#[derive(Serialize)]
struct ApplyReport {
    target: String,
    from: Side,
    dry_run: bool,
    applied_at: String,
    cells_written: usize,
    rows: Vec<AppliedRow>,
    not_found: Vec<String>,
}

pub fn cmd_apply(
    ctx: &RunContext,
    left: Option<PathBuf>,
    right: Option<PathBuf>,
    target: Option<PathBuf>,
    options: &DiffOptions,
    run: ApplyRun,
) -> CmdResult {
    let sides = ctx.read_sides(left, right)?;
    let target = ctx.resolve_path(target, "target", |p| p.target.as_ref())?;
    let diff = ctx.run_diff(&sides, options)?;

    let doc = open_target(&target, run.dry_run)?;
    let seed = doc.rows();
    let mut session = ReconcileSession::open_seeded(doc, &seed, ctx.locator_limits());
    let mode = if run.replace { CopyMode::Replace } else { CopyMode::Insert };

    let mut rows = Vec::new();
    for (position, row_diff) in diff.rows.iter().enumerate() {
        if !row_diff.status().is_change() || diff.is_header(position) {
            continue;
        }
        // rows that only exist on the other side have nothing to copy
        let Some(row) = row_diff.row(run.from) else { continue };
        let outcome = session.locator()?.copy_row(row, row.index + 1, mode)?;
        rows.push(AppliedRow {
            position,
            key: row.key().to_string(),
            status: row_diff.status(),
            outcome,
        });
    }

    let doc = session.finish()?;
    info!("{} mutations on {}", doc.mutations(), doc.path().display());

    let report = ApplyReport {
        target: target.display().to_string(),
        from: run.from,
        dry_run: run.dry_run,
        applied_at: chrono::Local::now().to_rfc3339(),
        cells_written: rows.iter().map(|r| r.outcome.cells_written()).sum(),
        not_found: rows
            .iter()
            .filter(|r| r.outcome == CopyOutcome::NotFound)
            .map(|r| r.key.clone())
            .collect(),
        rows,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if run.json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{}", text).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        write_apply_text(&mut out, &report).map_err(|e| CliError::io(e.to_string()))?;
    }

    Ok(EXIT_SUCCESS)
}

fn write_apply_text(out: &mut impl Write, report: &ApplyReport) -> io::Result<()> {
    for row in &report.rows {
        match row.outcome {
            CopyOutcome::Written { row: at, cells_written, inserted } => {
                let verb = if inserted { "inserted at" } else { "written to" };
                writeln!(out, "{}  {} row {} ({} cells)", row.key, verb, at, cells_written)?;
            }
            CopyOutcome::NotFound => writeln!(out, "{}  not found", row.key)?,
        }
    }
    let prefix = if report.dry_run { "would write" } else { "wrote" };
    writeln!(
        out,
        "{} {} cells to {} ({} rows not found)",
        prefix,
        report.cells_written,
        report.target,
        report.not_found.len()
    )
}

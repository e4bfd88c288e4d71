//! Line and character refinement of a modified cell value.
//!
//! Values are split on `\n` with trailing whitespace trimmed per line, the
//! line sequences are diffed, and every modified line pair is diffed again
//! character by character. Each side gets its own list of tagged runs so the
//! two values can be rendered next to each other with aligned lines.

use serde::Serialize;

use crate::sequence::{diff_paired, DiffResult, DiffStatus};

/// Full-width blank used to pad multi-byte characters.
const WIDE_BLANK: char = '\u{3000}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Unchanged,
    Modified,
    Deleted,
    Inserted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub kind: RunKind,
}

impl TextRun {
    fn new(text: impl Into<String>, kind: RunKind) -> Self {
        Self { text: text.into(), kind }
    }
}

/// One aligned line of the value diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiff {
    pub status: DiffStatus,
    pub left: Vec<TextRun>,
    pub right: Vec<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValueDiff {
    pub lines: Vec<LineDiff>,
}

impl ValueDiff {
    /// Plain text of one side with padding included, lines joined by `\n`.
    pub fn render_left(&self) -> String {
        render(self.lines.iter().map(|l| &l.left))
    }

    pub fn render_right(&self) -> String {
        render(self.lines.iter().map(|l| &l.right))
    }

    pub fn is_unchanged(&self) -> bool {
        self.lines.iter().all(|l| l.status == DiffStatus::Equal)
    }
}

fn render<'a>(lines: impl Iterator<Item = &'a Vec<TextRun>>) -> String {
    lines
        .map(|runs| runs.iter().map(|r| r.text.as_str()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn split_lines(value: &str) -> Vec<String> {
    value.split('\n').map(|l| l.trim_end().to_string()).collect()
}

/// Diff two cell values line by line, then character by character inside
/// modified lines.
pub fn diff_value(left: &str, right: &str) -> ValueDiff {
    let left_lines = split_lines(left);
    let right_lines = split_lines(right);

    let lines = diff_paired(&left_lines, &right_lines, |a, b| a == b)
        .into_iter()
        .map(refine_line)
        .collect();

    ValueDiff { lines }
}

fn refine_line(line: DiffResult<String>) -> LineDiff {
    let left = line.left.unwrap_or_default();
    let right = line.right.unwrap_or_default();

    match line.status {
        DiffStatus::Equal => LineDiff {
            status: DiffStatus::Equal,
            left: vec![TextRun::new(left.clone(), RunKind::Unchanged)],
            right: vec![TextRun::new(left, RunKind::Unchanged)],
        },
        DiffStatus::Deleted => LineDiff {
            status: DiffStatus::Deleted,
            right: vec![TextRun::new(blank_glyphs(&left), RunKind::Deleted)],
            left: vec![TextRun::new(left, RunKind::Deleted)],
        },
        DiffStatus::Inserted => LineDiff {
            status: DiffStatus::Inserted,
            left: vec![TextRun::new(blank_glyphs(&right), RunKind::Inserted)],
            right: vec![TextRun::new(right, RunKind::Inserted)],
        },
        DiffStatus::Modified => {
            let (l, r) = diff_chars(&left, &right);
            LineDiff { status: DiffStatus::Modified, left: l, right: r }
        }
    }
}

/// Character diff of a modified line pair, as left and right run lists.
///
/// The left side takes every result that is not an insertion, the right side
/// every result that is not a deletion.
pub fn diff_chars(left: &str, right: &str) -> (Vec<TextRun>, Vec<TextRun>) {
    let lc: Vec<char> = left.chars().collect();
    let rc: Vec<char> = right.chars().collect();
    let results = diff_paired(&lc, &rc, |a, b| a == b);

    let mut left_runs = RunBuilder::default();
    let mut right_runs = RunBuilder::default();

    for r in &results {
        match r.status {
            DiffStatus::Equal => {
                if let Some(c) = r.left {
                    left_runs.push(c, RunKind::Unchanged);
                    right_runs.push(c, RunKind::Unchanged);
                }
            }
            DiffStatus::Modified => {
                if let Some(c) = r.left {
                    left_runs.push(c, RunKind::Modified);
                }
                if let Some(c) = r.right {
                    right_runs.push(c, RunKind::Modified);
                }
            }
            DiffStatus::Deleted => {
                if let Some(c) = r.left {
                    left_runs.push(c, RunKind::Deleted);
                }
            }
            DiffStatus::Inserted => {
                if let Some(c) = r.right {
                    right_runs.push(c, RunKind::Inserted);
                }
            }
        }
    }

    (left_runs.finish(), right_runs.finish())
}

/// Same-width padding for `text`: a full-width blank for every multi-byte
/// character, a narrow blank otherwise.
pub fn blank_glyphs(text: &str) -> String {
    text.chars()
        .map(|c| if c.len_utf8() > 1 { WIDE_BLANK } else { ' ' })
        .collect()
}

/// Coalesces consecutive characters of the same kind.
#[derive(Default)]
struct RunBuilder {
    runs: Vec<TextRun>,
}

impl RunBuilder {
    fn push(&mut self, c: char, kind: RunKind) {
        match self.runs.last_mut() {
            Some(last) if last.kind == kind => last.text.push(c),
            _ => self.runs.push(TextRun::new(c.to_string(), kind)),
        }
    }

    fn finish(self) -> Vec<TextRun> {
        self.runs
    }
}

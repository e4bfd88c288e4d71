//! Plain-text change log for a range of diff rows.
//!
//! Templates use `${ROW}`, `${COL}`, `${LEFT}` and `${RIGHT}` placeholders.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::sequence::DiffStatus;
use crate::sheet_diff::SheetDiff;

/// Substituted for empty texts.
pub const BLANK_WORD: &str = "(blank)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFormats {
    pub modified: String,
    pub added: String,
    pub removed: String,
}

impl Default for LogFormats {
    fn default() -> Self {
        Self {
            modified: "${ROW} / ${COL}: ${LEFT} -> ${RIGHT}".to_string(),
            added: "${ROW}: row added".to_string(),
            removed: "${ROW}: row removed".to_string(),
        }
    }
}

/// Collapse line breaks so each entry stays on one line.
pub fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

fn or_blank(text: &str) -> &str {
    if text.is_empty() {
        BLANK_WORD
    } else {
        text
    }
}

/// One line per added or removed row, one line per modified cell.
/// Header rows are never logged.
pub fn build_change_log(diff: &SheetDiff, rows: Range<usize>, formats: &LogFormats) -> Vec<String> {
    let mut lines = Vec::new();
    let end = rows.end.min(diff.len());

    for position in rows.start..end {
        let Some(row) = diff.row(position) else { continue };
        if diff.is_header(position) {
            continue;
        }
        let row_header = row.header_text();

        match row.status() {
            DiffStatus::Inserted => {
                lines.push(formats.added.replace("${ROW}", &single_line(or_blank(row_header))));
                continue;
            }
            DiffStatus::Deleted => {
                lines.push(formats.removed.replace("${ROW}", &single_line(or_blank(row_header))));
                continue;
            }
            DiffStatus::Equal => continue,
            DiffStatus::Modified => {}
        }

        for cell in row.cells.iter().filter(|c| c.status == DiffStatus::Modified) {
            let left = cell.left.as_deref().unwrap_or("");
            let right = cell.right.as_deref().unwrap_or("");
            let column = diff.column_header_text(cell.column);

            lines.push(
                formats
                    .modified
                    .replace("${ROW}", &single_line(or_blank(row_header)))
                    .replace("${COL}", &single_line(or_blank(column)))
                    .replace("${LEFT}", &single_line(or_blank(left)))
                    .replace("${RIGHT}", &single_line(or_blank(right))),
            );
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::sheet_diff::{diff_sheets, DiffConfig};

    fn rows(d: &[&[&str]]) -> Vec<Row> {
        d.iter().enumerate().map(|(i, v)| Row::from_values(i, v)).collect()
    }

    #[test]
    fn logs_each_change_kind() {
        let left = rows(&[&["id", "name", "note"], &["1", "a", ""], &["2", "b", "x"]]);
        let right = rows(&[&["id", "name", "note"], &["1", "A", "line1\nline2"], &["3", "c", ""]]);
        let config = DiffConfig {
            left_header_index: Some(0),
            right_header_index: Some(0),
            ..Default::default()
        };
        let diff = diff_sheets(&left, &right, &config);
        let log = build_change_log(&diff, 0..diff.len(), &LogFormats::default());
        assert_eq!(
            log,
            vec![
                "1 / name: a -> A".to_string(),
                "1 / note: (blank) -> line1 line2".to_string(),
                "2: row removed".to_string(),
                "3: row added".to_string(),
            ]
        );
    }

    #[test]
    fn header_row_is_skipped() {
        let left = rows(&[&["id", "name"], &["1", "a"]]);
        let right = rows(&[&["id", "label"], &["1", "a"]]);
        let config = DiffConfig {
            left_header_index: Some(0),
            right_header_index: Some(0),
            ..Default::default()
        };
        let diff = diff_sheets(&left, &right, &config);
        assert!(diff.has_diff());
        assert!(build_change_log(&diff, 0..10, &LogFormats::default()).is_empty());
    }

    #[test]
    fn added_or_removed_header_rows_are_skipped() {
        let left = rows(&[&["id", "v"], &["", "x"]]);
        let right = rows(&[&["ID", "v"]]);
        let config = DiffConfig {
            left_header_index: Some(0),
            right_header_index: Some(0),
            ..Default::default()
        };
        let diff = diff_sheets(&left, &right, &config);
        assert_eq!(
            build_change_log(&diff, 0..diff.len(), &LogFormats::default()),
            vec!["(blank): row removed".to_string()]
        );
    }

    #[test]
    fn blank_key_on_added_row() {
        let left = rows(&[&["a", "1"]]);
        let right = rows(&[&["a", "1"], &["", "2"]]);
        let diff = diff_sheets(&left, &right, &DiffConfig::default());
        assert_eq!(
            build_change_log(&diff, 0..diff.len(), &LogFormats::default()),
            vec!["(blank): row added".to_string()]
        );
    }

    #[test]
    fn custom_templates() {
        let left = rows(&[&["k", "1"]]);
        let right = rows(&[&["k", "2"]]);
        let diff = diff_sheets(&left, &right, &DiffConfig::default());
        let formats = LogFormats {
            modified: "[${ROW}] col ${COL}: ${LEFT}=>${RIGHT}".to_string(),
            ..Default::default()
        };
        assert_eq!(
            build_change_log(&diff, 0..1, &formats),
            vec!["[k] col (blank): 1=>2".to_string()]
        );
    }

    #[test]
    fn line_breaks_collapse() {
        assert_eq!(single_line("a\r\nb\nc\rd"), "a b c d");
    }
}

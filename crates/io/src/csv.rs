// CSV/TSV reading into diff rows, plus writing a plain grid back out

use std::io::Read;
use std::path::Path;

use gridmerge_engine::{Cell, Row};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Field delimiter; sniffed from the content when `None`.
    pub delimiter: Option<u8>,
    /// Consecutive empty cells after which the rest of a row is dropped,
    /// once the row is already wider than every row before it.
    pub blank_column_limit: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { delimiter: None, blank_column_limit: 10 }
    }
}

pub fn read_rows(path: &Path, options: &ReadOptions) -> Result<Vec<Row>, String> {
    let content = read_file_as_utf8(path)?;
    let options = ReadOptions {
        delimiter: options.delimiter.or_else(|| delimiter_for_extension(path)),
        ..*options
    };
    read_rows_from_str(&content, &options)
}

/// `.tsv` files are always tab-separated.
fn delimiter_for_extension(path: &Path) -> Option<u8> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.eq_ignore_ascii_case("tsv"))
        .map(|_| b'\t')
}

pub fn read_rows_from_str(content: &str, options: &ReadOptions) -> Result<Vec<Row>, String> {
    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(content));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut widest = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| format!("row {}: {}", row_idx + 1, e))?;
        let mut cells = Vec::with_capacity(record.len());
        let mut blank_run = 0usize;

        for (col_idx, field) in record.iter().enumerate() {
            cells.push(Cell::new(field, col_idx, row_idx));
            if field.is_empty() {
                blank_run += 1;
            } else {
                blank_run = 0;
            }
            if blank_run > options.blank_column_limit && col_idx > widest {
                break;
            }
        }
        widest = widest.max(cells.len().saturating_sub(1));
        rows.push(Row::new(row_idx, cells));
    }

    debug!("read {} rows (delimiter {:?})", rows.len(), delimiter as char);
    Ok(rows)
}

/// Plain grid of strings, for documents that are edited and saved back.
pub fn read_grid(path: &Path) -> Result<(Vec<Vec<String>>, u8), String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter_for_extension(path).unwrap_or_else(|| sniff_delimiter(&content));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok((grid, delimiter))
}

/// Write a grid; trailing empty cells of each row are omitted.
pub fn write_grid(path: &Path, grid: &[Vec<String>], delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    for row in grid {
        let last_non_empty = row.iter().rposition(|v| !v.is_empty()).map(|i| i + 1).unwrap_or(0);
        if last_non_empty == 0 {
            // an empty record would be skipped by the reader and shift every row below
            writer.write_record([""]).map_err(|e| e.to_string())?;
            continue;
        }
        writer.write_record(&row[..last_non_empty]).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // consistent lines × field count; wider wins ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(rest) => Ok(rest.to_string()),
            None => Ok(s),
        },
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

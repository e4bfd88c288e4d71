// File I/O operations

pub mod csv;
pub mod document;

pub use csv::{read_rows, read_rows_from_str, ReadOptions};
pub use document::CsvDocument;

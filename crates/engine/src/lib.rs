//! `gridmerge-engine`: row/cell diff of two tabular documents.
//!
//! Pure engine crate: receives rows, returns the nested diff, its summary and
//! a navigation index. No IO dependencies.

pub mod changelog;
pub mod index;
pub mod model;
pub mod progress;
pub mod sequence;
pub mod sheet_diff;
pub mod summary;
pub mod text_diff;

pub use index::{CellAddress, DiffIndex, Direction, MatchQuery, SearchError, Target};
pub use model::{Cell, CompareMode, Row, RowComparer, RowEquality, RowKeyComparer};
pub use sequence::{DiffResult, DiffStatus};
pub use sheet_diff::{diff_sheets, diff_sheets_with_progress, CellDiff, DiffConfig, RowDiff, SheetDiff, Side};
pub use summary::DiffSummary;

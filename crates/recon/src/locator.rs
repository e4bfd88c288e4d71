//! Find the live-document row or column that a diff row/column refers to.
//!
//! Rows are matched on the trimmed text of their key cell. The search starts
//! from a probe row chosen via the cache or a numeric-distance heuristic and
//! expands in both directions, caching every non-empty key it reads. Each
//! direction retires once it reads too many consecutive blank keys or runs
//! off the document.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cache::LocatorCache;
use crate::document::LiveDocument;
use crate::error::ReconError;

/// Outcome of a locate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "index", rename_all = "snake_case")]
pub enum Located {
    Exact(usize),
    /// Search budget exhausted; index is the first probe row.
    Nearest(usize),
    NotFound,
}

impl Located {
    /// `1` exact, `0` nearest, `-1` not found.
    pub fn status_code(&self) -> i8 {
        match self {
            Located::Exact(_) => 1,
            Located::Nearest(_) => 0,
            Located::NotFound => -1,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Located::Exact(i) | Located::Nearest(i) => Some(*i),
            Located::NotFound => None,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Located::Exact(_))
    }
}

/// Probe budget for one locate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorLimits {
    /// Consecutive empty keys after which a search direction gives up.
    pub blank_row_limit: usize,
    /// Consecutive empty headers after which the column scan gives up.
    pub blank_column_limit: usize,
    /// Expanding search stops before this step.
    pub max_search_steps: usize,
}

impl Default for LocatorLimits {
    fn default() -> Self {
        Self {
            blank_row_limit: 50,
            blank_column_limit: 10,
            max_search_steps: 100,
        }
    }
}

/// One search direction of the expanding row search.
#[derive(Debug, Default)]
struct Probe {
    retired: bool,
    blank_run: usize,
}

impl Probe {
    fn record(&mut self, text: &str, limit: usize) {
        if text.is_empty() {
            self.blank_run += 1;
            if self.blank_run > limit {
                self.retired = true;
            }
        } else {
            self.blank_run = 0;
        }
    }
}

/// Owns the live document and its lookup cache for one session.
pub struct TargetLocator<D: LiveDocument> {
    pub(crate) document: D,
    pub(crate) cache: LocatorCache,
    limits: LocatorLimits,
}

impl<D: LiveDocument> TargetLocator<D> {
    pub fn new(document: D, limits: LocatorLimits) -> Self {
        Self::with_cache(document, LocatorCache::new(), limits)
    }

    pub fn with_cache(document: D, cache: LocatorCache, limits: LocatorLimits) -> Self {
        Self { document, cache, limits }
    }

    pub fn cache(&self) -> &LocatorCache {
        &self.cache
    }

    pub fn limits(&self) -> LocatorLimits {
        self.limits
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn into_parts(self) -> (D, LocatorCache) {
        (self.document, self.cache)
    }

    /// Locate the row whose key is `header_text`. `suggested` is the row the
    /// caller expects it at (1-based).
    pub fn locate(&mut self, header_text: &str, suggested: usize) -> Result<Located, ReconError> {
        let header = header_text.trim();
        let target = self.probe_target(header, suggested);

        let live = self.document.read_row_header(target)?;
        if live == header {
            self.cache.insert(header, target);
            debug!("located '{}' at row {} on first probe", header, target);
            return Ok(Located::Exact(target));
        }

        let rows = self.document.row_count();
        let mut back = Probe::default();
        let mut forward = Probe::default();

        let mut step = 1;
        while step < self.limits.max_search_steps {
            if !back.retired {
                if step >= target {
                    back.retired = true;
                } else if target - step > rows {
                    // still walking back toward the end of the document
                } else if let Some(found) = self.probe(target - step, header, &mut back)? {
                    return Ok(Located::Exact(found));
                }
            }
            if !forward.retired {
                let row = target + step;
                if row > rows {
                    forward.retired = true;
                } else if let Some(found) = self.probe(row, header, &mut forward)? {
                    return Ok(Located::Exact(found));
                }
            }
            if back.retired && forward.retired {
                debug!("'{}' not found around row {} after {} steps", header, target, step);
                return Ok(Located::NotFound);
            }
            step += 1;
        }

        debug!("search cap reached for '{}', using row {}", header, target);
        Ok(Located::Nearest(target))
    }

    fn probe(&mut self, row: usize, header: &str, direction: &mut Probe) -> Result<Option<usize>, ReconError> {
        let live = self.document.read_row_header(row)?;
        if !live.is_empty() {
            self.cache.insert(&live, row);
        }
        if live == header {
            return Ok(Some(row));
        }
        direction.record(&live, self.limits.blank_row_limit);
        Ok(None)
    }

    /// Choose the first row to read: cached index, numerically closest cached
    /// key, or the caller's suggestion.
    fn probe_target(&self, header: &str, suggested: usize) -> usize {
        if let Some(row) = self.cache.get(header) {
            return row;
        }
        let Ok(wanted) = header.parse::<i64>() else {
            return suggested;
        };

        let suggested_distance = self
            .document
            .read_row_header(suggested)
            .ok()
            .and_then(|text| text.parse::<i64>().ok())
            .map(|n| n.abs_diff(wanted));

        match (self.cache.nearest_numeric(wanted), suggested_distance) {
            (Some((_, cached)), Some(own)) if own < cached => suggested,
            (Some((row, _)), _) => row,
            (None, _) => suggested,
        }
    }

    /// Scan the header row left to right for `header_text`.
    ///
    /// `suggested` is not used to start the scan; it is only logged.
    pub fn locate_column(&self, header_text: &str, suggested: usize) -> Result<Located, ReconError> {
        let header = header_text.trim();
        let mut blank_run = 0;
        for column in 1..=self.document.column_count() {
            let live = self.document.read_column_header(column)?;
            if live == header {
                return Ok(Located::Exact(column));
            }
            if live.is_empty() {
                blank_run += 1;
                if blank_run > self.limits.blank_column_limit {
                    break;
                }
            } else {
                blank_run = 0;
            }
        }
        debug!("column '{}' not found (suggested {})", header, suggested);
        Ok(Located::NotFound)
    }

    /// Best-effort cursor move; failures are logged and dropped.
    pub fn activate(&mut self, row: usize, column: usize) {
        if row < 1 || column < 1 {
            return;
        }
        if let Err(e) = self.document.activate_cell(row, column) {
            warn!("could not activate cell ({}, {}): {}", row, column, e);
        }
    }
}

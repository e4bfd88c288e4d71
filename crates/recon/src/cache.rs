//! Header text → live row index, filled while locating.

use std::collections::HashMap;

use gridmerge_engine::Row;
use log::debug;

#[derive(Debug, Clone, Default)]
pub struct LocatorCache {
    rows: HashMap<String, usize>,
}

impl LocatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, header: &str) -> Option<usize> {
        self.rows.get(header).copied()
    }

    pub(crate) fn insert(&mut self, header: &str, row: usize) {
        self.rows.insert(header.to_string(), row);
    }

    /// Entry whose key, read as an integer, is closest to `value`.
    /// Returns `(row, distance)`; ties go to the lower row.
    pub fn nearest_numeric(&self, value: i64) -> Option<(usize, u64)> {
        self.rows
            .iter()
            .filter_map(|(key, &row)| {
                key.trim()
                    .parse::<i64>()
                    .ok()
                    .map(|n| (row, n.abs_diff(value)))
            })
            .min_by_key(|&(row, distance)| (distance, row))
    }

    /// Rows at or below `row` moved down by one.
    pub(crate) fn shift_from(&mut self, row: usize) {
        for index in self.rows.values_mut() {
            if *index >= row {
                *index += 1;
            }
        }
    }

    /// Seed from the rows of a target file read up front.
    ///
    /// Keys map to the 1-based live row of `Row::index`; the first occurrence
    /// of a key wins. Reading stops once more than `blank_limit` consecutive
    /// rows have an empty key.
    pub fn seed_from_rows(rows: &[Row], blank_limit: usize) -> Self {
        let mut cache = Self::new();
        let mut blanks = 0;
        for row in rows {
            if row.is_empty() {
                continue;
            }
            let key = row.key().trim();
            if key.is_empty() {
                blanks += 1;
            } else {
                blanks = 0;
                cache.rows.entry(key.to_string()).or_insert(row.index + 1);
            }
            if blanks > blank_limit {
                break;
            }
        }
        debug!("seeded locator cache with {} keys", cache.len());
        cache
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.rows.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, usize)> for LocatorCache {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        Self { rows: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_numeric_prefers_smallest_distance() {
        let mut cache = LocatorCache::new();
        cache.insert("10", 10);
        cache.insert("50", 50);
        cache.insert("name", 3);
        assert_eq!(cache.nearest_numeric(12), Some((10, 2)));
        assert_eq!(cache.nearest_numeric(45), Some((50, 5)));
        assert_eq!(LocatorCache::new().nearest_numeric(1), None);
    }

    #[test]
    fn nearest_numeric_ties_go_to_lower_row() {
        let mut cache = LocatorCache::new();
        cache.insert("8", 30);
        cache.insert("12", 20);
        assert_eq!(cache.nearest_numeric(10), Some((20, 2)));
    }

    #[test]
    fn seeding_keeps_first_occurrence() {
        let rows = vec![
            Row::from_values(0, &["id", "v"]),
            Row::from_values(1, &["a", "1"]),
            Row::from_values(2, &[" a ", "2"]),
            Row::from_values(3, &["b", "3"]),
        ];
        let cache = LocatorCache::seed_from_rows(&rows, 50);
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.get("b"), Some(4));
        assert_eq!(cache.get("id"), Some(1));
    }

    #[test]
    fn seeding_stops_after_blank_run() {
        let mut rows = vec![Row::from_values(0, &["a"])];
        for i in 1..=4 {
            rows.push(Row::from_values(i, &[""]));
        }
        rows.push(Row::from_values(5, &["late"]));
        let cache = LocatorCache::seed_from_rows(&rows, 3);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("late"), None);
    }

    #[test]
    fn shifting_moves_rows_below_insert() {
        let mut cache = LocatorCache::new();
        cache.insert("a", 2);
        cache.insert("b", 5);
        cache.shift_from(3);
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.get("b"), Some(6));
    }
}

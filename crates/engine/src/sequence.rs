//! Sequence diff over ordered, comparable items.
//!
//! Alignment uses Myers' O((N+M)·D) algorithm in its linear-space
//! divide-and-conquer form, so large inputs with few differences stay cheap.
//! The raw edit script only ever contains equal, deleted and inserted items;
//! [`order_delete_first`] and [`pair_modified`] are separate passes applied on
//! top of it.

use std::ops::{Index, IndexMut, Range};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Equal,
    Modified,
    Inserted,
    Deleted,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Equal => "equal",
            DiffStatus::Modified => "modified",
            DiffStatus::Inserted => "inserted",
            DiffStatus::Deleted => "deleted",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, DiffStatus::Equal)
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One aligned position of the two inputs.
///
/// `left`/`left_index` are present for equal, modified and deleted items;
/// `right`/`right_index` for equal, modified and inserted items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult<T> {
    pub left: Option<T>,
    pub right: Option<T>,
    pub status: DiffStatus,
    pub left_index: Option<usize>,
    pub right_index: Option<usize>,
}

impl<T> DiffResult<T> {
    pub fn paired(left: T, left_index: usize, right: T, right_index: usize, status: DiffStatus) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            status,
            left_index: Some(left_index),
            right_index: Some(right_index),
        }
    }

    pub fn deleted(left: T, left_index: usize) -> Self {
        Self {
            left: Some(left),
            right: None,
            status: DiffStatus::Deleted,
            left_index: Some(left_index),
            right_index: None,
        }
    }

    pub fn inserted(right: T, right_index: usize) -> Self {
        Self {
            left: None,
            right: Some(right),
            status: DiffStatus::Inserted,
            left_index: None,
            right_index: Some(right_index),
        }
    }
}

/// Raw alignment step, by index into the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Equal { left: usize, right: usize },
    Delete { left: usize },
    Insert { right: usize },
}

/// Align `left` and `right` and return the raw results in traversal order.
pub fn diff<T: Clone>(left: &[T], right: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<DiffResult<T>> {
    let script = edit_script(left.len(), right.len(), |i, j| eq(&left[i], &right[j]));
    materialize(&script, left, right)
}

/// Turn an index-based edit script back into results carrying the items.
pub fn materialize<T: Clone>(script: &[Edit], left: &[T], right: &[T]) -> Vec<DiffResult<T>> {
    script
        .iter()
        .copied()
        .map(|edit| match edit {
            Edit::Equal { left: i, right: j } => {
                DiffResult::paired(left[i].clone(), i, right[j].clone(), j, DiffStatus::Equal)
            }
            Edit::Delete { left: i } => DiffResult::deleted(left[i].clone(), i),
            Edit::Insert { right: j } => DiffResult::inserted(right[j].clone(), j),
        })
        .collect()
}

/// Diff, canonicalize and pair: the form used for line and character diffs.
pub fn diff_paired<T: Clone>(left: &[T], right: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<DiffResult<T>> {
    pair_modified(order_delete_first(diff(left, right, eq)))
}

/// Minimal edit script for sequences of length `n` and `m`, where
/// `eq(i, j)` compares `left[i]` with `right[j]`.
pub fn edit_script(n: usize, m: usize, eq: impl Fn(usize, usize) -> bool) -> Vec<Edit> {
    let max_d = max_d(n, m);
    let mut myers = Myers {
        eq: &eq,
        vf: V::new(max_d),
        vb: V::new(max_d),
        out: Vec::with_capacity(n.max(m)),
    };
    myers.conquer(0..n, 0..m);
    myers.out
}

/// Reorder every run of adjacent deletions and insertions so that all
/// deletions come first, keeping relative order inside each group.
///
/// Equal and modified items act as run boundaries. The pass is idempotent and
/// does not depend on which input is treated as the source.
pub fn order_delete_first<T>(results: Vec<DiffResult<T>>) -> Vec<DiffResult<T>> {
    let mut out = Vec::with_capacity(results.len());
    let mut deletes = Vec::new();
    let mut inserts = Vec::new();

    for r in results {
        match r.status {
            DiffStatus::Deleted => deletes.push(r),
            DiffStatus::Inserted => inserts.push(r),
            _ => {
                out.append(&mut deletes);
                out.append(&mut inserts);
                out.push(r);
            }
        }
    }
    out.append(&mut deletes);
    out.append(&mut inserts);
    out
}

/// Turn positionally aligned deletion/insertion pairs inside a change run
/// into `Modified` items. Surplus deletions or insertions keep their status
/// and follow the pairs.
pub fn pair_modified<T>(results: Vec<DiffResult<T>>) -> Vec<DiffResult<T>> {
    let mut out = Vec::with_capacity(results.len());
    let mut deletes = Vec::new();
    let mut inserts = Vec::new();

    for r in results {
        match r.status {
            DiffStatus::Deleted => deletes.push(r),
            DiffStatus::Inserted => inserts.push(r),
            _ => {
                flush_pairs(&mut out, &mut deletes, &mut inserts);
                out.push(r);
            }
        }
    }
    flush_pairs(&mut out, &mut deletes, &mut inserts);
    out
}

fn flush_pairs<T>(
    out: &mut Vec<DiffResult<T>>,
    deletes: &mut Vec<DiffResult<T>>,
    inserts: &mut Vec<DiffResult<T>>,
) {
    let paired = deletes.len().min(inserts.len());
    let mut dels = deletes.drain(..);
    let mut ins = inserts.drain(..);

    for _ in 0..paired {
        if let (Some(d), Some(i)) = (dels.next(), ins.next()) {
            out.push(DiffResult {
                left: d.left,
                right: i.right,
                status: DiffStatus::Modified,
                left_index: d.left_index,
                right_index: i.right_index,
            });
        }
    }
    out.extend(dels);
    out.extend(ins);
}

// ---------------------------------------------------------------------------
// Myers middle-snake search
// ---------------------------------------------------------------------------

fn max_d(n: usize, m: usize) -> usize {
    (n + m + 1) / 2 + 1
}

/// Furthest-reaching x per diagonal, indexed by signed diagonal `k`.
struct V {
    offset: isize,
    v: Vec<usize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        Self { offset: max_d as isize, v: vec![0; 2 * max_d] }
    }
}

impl Index<isize> for V {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.v[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.v[(k + self.offset) as usize]
    }
}

struct Myers<'a, F> {
    eq: &'a F,
    vf: V,
    vb: V,
    out: Vec<Edit>,
}

impl<F: Fn(usize, usize) -> bool> Myers<'_, F> {
    fn common_prefix(&self, left: Range<usize>, right: Range<usize>) -> usize {
        left.zip(right).take_while(|&(i, j)| (self.eq)(i, j)).count()
    }

    fn common_suffix(&self, left: Range<usize>, right: Range<usize>) -> usize {
        left.rev().zip(right.rev()).take_while(|&(i, j)| (self.eq)(i, j)).count()
    }

    fn emit_equal(&mut self, left_start: usize, right_start: usize, len: usize) {
        for offset in 0..len {
            self.out.push(Edit::Equal { left: left_start + offset, right: right_start + offset });
        }
    }

    fn conquer(&mut self, mut left: Range<usize>, mut right: Range<usize>) {
        let prefix = self.common_prefix(left.clone(), right.clone());
        self.emit_equal(left.start, right.start, prefix);
        left.start += prefix;
        right.start += prefix;

        let suffix = self.common_suffix(left.clone(), right.clone());
        left.end -= suffix;
        right.end -= suffix;
        let suffix_start = (left.end, right.end);

        if left.is_empty() && right.is_empty() {
            // nothing between prefix and suffix
        } else if right.is_empty() {
            self.out.extend(left.clone().map(|i| Edit::Delete { left: i }));
        } else if left.is_empty() {
            self.out.extend(right.clone().map(|j| Edit::Insert { right: j }));
        } else if let Some((x, y)) = self.find_middle_snake(left.clone(), right.clone()) {
            self.conquer(left.start..x, right.start..y);
            self.conquer(x..left.end, y..right.end);
        } else {
            self.out.extend(left.clone().map(|i| Edit::Delete { left: i }));
            self.out.extend(right.clone().map(|j| Edit::Insert { right: j }));
        }

        self.emit_equal(suffix_start.0, suffix_start.1, suffix);
    }

    /// Find the start of the middle snake of the optimal path through
    /// `left × right`, searching forward and backward at once.
    fn find_middle_snake(&mut self, left: Range<usize>, right: Range<usize>) -> Option<(usize, usize)> {
        let n = left.len();
        let m = right.len();
        let delta = n as isize - m as isize;
        let odd = delta & 1 == 1;

        self.vf[1] = 0;
        self.vb[1] = 0;

        let d_max = max_d(n, m) as isize;
        for d in 0..d_max {
            // Forward
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.vf[k - 1] < self.vf[k + 1]) {
                    self.vf[k + 1]
                } else {
                    self.vf[k - 1] + 1
                };
                let y = (x as isize - k) as usize;
                let (x0, y0) = (x, y);

                if x < n && y < m {
                    x += self.common_prefix(left.start + x..left.end, right.start + y..right.end);
                }
                self.vf[k] = x;

                if odd && (k - delta).abs() <= d - 1 && self.vf[k] + self.vb[-(k - delta)] >= n {
                    return Some((x0 + left.start, y0 + right.start));
                }
            }

            // Backward
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.vb[k - 1] < self.vb[k + 1]) {
                    self.vb[k + 1]
                } else {
                    self.vb[k - 1] + 1
                };
                let mut y = (x as isize - k) as usize;

                if x < n && y < m {
                    let advance = self.common_suffix(
                        left.start..left.start + n - x,
                        right.start..right.start + m - y,
                    );
                    x += advance;
                    y += advance;
                }
                self.vb[k] = x;

                if !odd && (k - delta).abs() <= d && self.vb[k] + self.vf[-(k - delta)] >= n {
                    return Some((n - x + left.start, m - y + right.start));
                }
            }
        }
        None
    }
}

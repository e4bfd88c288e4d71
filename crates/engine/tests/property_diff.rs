// Property-based tests for the sequence and sheet diff.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use gridmerge_engine::sequence::{self, order_delete_first, DiffResult, DiffStatus};
use gridmerge_engine::{diff_sheets, CompareMode, DiffConfig, Row};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small alphabet so that sequences share plenty of items.
fn arb_seq(max: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..4, 0..=max)
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[a-c]{1,2}",
        1 => Just("".to_string()),
    ]
}

fn arb_rows(max: usize) -> impl Strategy<Value = Vec<Vec<String>>> {
    proptest::collection::vec(proptest::collection::vec(arb_value(), 1..4), 0..=max)
}

fn to_rows(data: &[Vec<String>]) -> Vec<Row> {
    data.iter().enumerate().map(|(i, v)| Row::from_values(i, v)).collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }
    dp[a.len()][b.len()]
}

fn count<T>(results: &[DiffResult<T>], status: DiffStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn edit_count_is_minimal(a in arb_seq(12), b in arb_seq(12)) {
        let results = sequence::diff(&a, &b, |x, y| x == y);
        let lcs = lcs_len(&a, &b);
        prop_assert_eq!(count(&results, DiffStatus::Equal), lcs);
        prop_assert_eq!(count(&results, DiffStatus::Deleted), a.len() - lcs);
        prop_assert_eq!(count(&results, DiffStatus::Inserted), b.len() - lcs);
    }

    #[test]
    fn results_preserve_traversal_order(a in arb_seq(20), b in arb_seq(20)) {
        let results = sequence::diff_paired(&a, &b, |x, y| x == y);
        let left: Vec<u8> = results.iter().filter_map(|r| r.left).collect();
        let right: Vec<u8> = results.iter().filter_map(|r| r.right).collect();
        prop_assert_eq!(left, a);
        prop_assert_eq!(right, b);
        for r in &results {
            if r.status == DiffStatus::Equal {
                prop_assert_eq!(r.left, r.right);
            }
        }
    }

    #[test]
    fn delete_first_is_idempotent(a in arb_seq(16), b in arb_seq(16)) {
        let once = order_delete_first(sequence::diff(&a, &b, |x, y| x == y));
        let twice = order_delete_first(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sequence_diff_is_symmetric(a in arb_seq(16), b in arb_seq(16)) {
        let ab = sequence::diff(&a, &b, |x, y| x == y);
        let ba = sequence::diff(&b, &a, |x, y| x == y);
        prop_assert_eq!(count(&ab, DiffStatus::Inserted), count(&ba, DiffStatus::Deleted));
        prop_assert_eq!(count(&ab, DiffStatus::Deleted), count(&ba, DiffStatus::Inserted));
    }

    #[test]
    fn sheet_diff_of_itself_is_equal(data in arb_rows(10), full in any::<bool>()) {
        let rows = to_rows(&data);
        let config = DiffConfig {
            row_matching: if full { CompareMode::Full } else { CompareMode::KeyOnly },
            ..Default::default()
        };
        let diff = diff_sheets(&rows, &rows, &config);
        prop_assert!(diff.rows.iter().all(|r| r.status() == DiffStatus::Equal));
        prop_assert!(!diff.create_summary().has_diff());
    }

    #[test]
    fn sheet_diff_is_symmetric(a in arb_rows(10), b in arb_rows(10), full in any::<bool>()) {
        let left = to_rows(&a);
        let right = to_rows(&b);
        let config = DiffConfig {
            row_matching: if full { CompareMode::Full } else { CompareMode::KeyOnly },
            ..Default::default()
        };
        let ab = diff_sheets(&left, &right, &config).create_summary();
        let ba = diff_sheets(&right, &left, &config).create_summary();

        // each paired delete/insert removes one of each, so the net row delta holds in both modes
        let net = |added: usize, removed: usize| added as i64 - removed as i64;
        prop_assert_eq!(net(ab.added_rows, ab.removed_rows), b.len() as i64 - a.len() as i64);
        prop_assert_eq!(net(ab.added_rows, ab.removed_rows), -net(ba.added_rows, ba.removed_rows));
        if !full {
            prop_assert_eq!(ab.added_rows, ba.removed_rows);
            prop_assert_eq!(ab.removed_rows, ba.added_rows);
        }
    }
}

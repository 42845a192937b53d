//! Property-based tests for the audit core using proptest.

use std::collections::BTreeSet;

use proptest::prelude::*;

use fairaudit::agreement::PairCounts;
use fairaudit::detector::{detect_names, lcs_ratio};
use fairaudit::ground_truth::GroundTruthRecord;
use fairaudit::validator::score_detection;
use fairaudit::{AuditError, DetectorConfig};

fn column_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,14}"
}

// --- Similarity properties ---

proptest! {
    #[test]
    fn lcs_ratio_is_bounded_and_symmetric(a in "[a-z]{0,16}", b in "[a-z]{0,16}") {
        let forward = lcs_ratio(&a, &b);
        let backward = lcs_ratio(&b, &a);
        prop_assert!((0.0..=1.0).contains(&forward));
        prop_assert!((forward - backward).abs() < 1e-12);
    }

    #[test]
    fn lcs_ratio_identity(a in "[a-z]{1,16}") {
        prop_assert!((lcs_ratio(&a, &a) - 1.0).abs() < 1e-12);
    }
}

// --- Detector properties ---

proptest! {
    #[test]
    fn detection_is_idempotent(
        columns in prop::collection::vec(column_name(), 1..10),
        threshold in 0.05f64..1.0,
    ) {
        let config = DetectorConfig {
            similarity_threshold: threshold,
            ..DetectorConfig::default()
        };
        let first = detect_names("t", &columns, &config).unwrap();
        let second = detect_names("t", &columns, &config).unwrap();
        prop_assert_eq!(first.matches, second.matches);
    }

    #[test]
    fn raising_threshold_never_grows_the_flagged_set(
        columns in prop::collection::vec(column_name(), 1..10),
        low in 0.05f64..0.9,
        delta in 0.01f64..0.1,
    ) {
        let loose = DetectorConfig {
            similarity_threshold: low,
            ..DetectorConfig::default()
        };
        let tight = DetectorConfig {
            similarity_threshold: (low + delta).min(1.0),
            ..DetectorConfig::default()
        };
        let loose_set = detect_names("t", &columns, &loose).unwrap().flagged_columns();
        let tight_set = detect_names("t", &columns, &tight).unwrap().flagged_columns();
        prop_assert!(tight_set.is_subset(&loose_set));
    }

    #[test]
    fn scores_are_unit_interval_and_above_threshold(
        columns in prop::collection::vec(column_name(), 1..10),
        threshold in 0.05f64..1.0,
    ) {
        let config = DetectorConfig {
            similarity_threshold: threshold,
            value_escalation: false,
            ..DetectorConfig::default()
        };
        let result = detect_names("t", &columns, &config).unwrap();
        for m in &result.matches {
            prop_assert!((0.0..=1.0).contains(&m.score));
            prop_assert!(m.score >= threshold);
        }
    }
}

// --- Scoring properties ---

proptest! {
    #[test]
    fn detection_metrics_are_unit_interval(
        detected in prop::collection::btree_set(column_name(), 0..8),
        truth in prop::collection::btree_set(column_name(), 0..8),
    ) {
        let record = score_detection(
            &detected,
            &GroundTruthRecord::new("t", truth.clone()),
        );
        prop_assert!((0.0..=1.0).contains(&record.precision));
        prop_assert!((0.0..=1.0).contains(&record.recall));
        prop_assert!((0.0..=1.0).contains(&record.f1));
    }

    #[test]
    fn tp_fp_fn_partition_the_union(
        detected in prop::collection::btree_set(column_name(), 0..8),
        truth in prop::collection::btree_set(column_name(), 0..8),
    ) {
        let record = score_detection(
            &detected,
            &GroundTruthRecord::new("t", truth.clone()),
        );
        let union: BTreeSet<_> = detected.union(&truth).collect();
        prop_assert_eq!(
            record.true_positives + record.false_positives + record.false_negatives,
            union.len()
        );
    }

    #[test]
    fn exact_detection_scores_perfectly(
        truth in prop::collection::btree_set(column_name(), 1..8),
    ) {
        let record = score_detection(
            &truth,
            &GroundTruthRecord::new("t", truth.clone()),
        );
        prop_assert_eq!(record.precision, 1.0);
        prop_assert_eq!(record.recall, 1.0);
        prop_assert_eq!(record.f1, 1.0);
    }
}

// --- Agreement properties ---

proptest! {
    #[test]
    fn kappa_is_bounded_or_explicitly_nan(
        both in 0usize..50,
        only_first in 0usize..50,
        only_second in 0usize..50,
        neither in 0usize..50,
    ) {
        let counts = PairCounts {
            both_sensitive: both,
            only_first,
            only_second,
            neither,
        };
        prop_assume!(counts.total() > 0);
        let kappa = counts.kappa();
        prop_assert!(kappa.is_nan() || (-1.0 - 1e-9..=1.0 + 1e-9).contains(&kappa));
    }
}

// --- Error contract ---

#[test]
fn empty_column_list_is_invalid_input() {
    let config = DetectorConfig::default();
    assert!(matches!(
        detect_names("t", &[], &config),
        Err(AuditError::InvalidInput(_))
    ));
}

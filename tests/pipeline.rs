//! End-to-end pipeline tests: a synthetic corpus on disk, detection,
//! scoring, aggregation, and the exclusion path.
//!
//! The injected-error detector here is a test fixture for exercising the
//! aggregation pipeline with imperfect detections; the production matcher
//! itself is deterministic.

use std::collections::BTreeSet;

use rand::prelude::*;
use rand::rngs::StdRng;

use fairaudit::ground_truth::GroundTruthRecord;
use fairaudit::validator::{summarize, ExcludedDataset};
use fairaudit::{run_validation, score_detection, AuditConfig, Dataset};

/// Write a small corpus of CSV files and return the loaded datasets plus
/// their ground truth.
fn build_corpus(dir: &std::path::Path) -> (Vec<Dataset>, Vec<GroundTruthRecord>) {
    let fixtures: &[(&str, &str, &[&str])] = &[
        (
            "adult.csv",
            "age,workclass,education,race,sex,income,target\n39,private,bachelors,White,M,50000,1\n50,public,hs,Black,F,32000,0\n",
            &["age", "race", "sex"],
        ),
        (
            "credit.csv",
            "loan_amount,marital_status,idade,score,target\n1000,married,34,700,1\n5000,single,29,650,0\n",
            &["marital_status", "idade"],
        ),
        (
            "hiring.csv",
            "experience,gender,education_level,target\n5,F,3,1\n8,M,2,1\n",
            &["gender"],
        ),
        (
            "sensors.csv",
            "s1,s2,s3,target\n0.1,0.2,0.3,1\n0.4,0.5,0.6,0\n",
            &[],
        ),
    ];

    let mut datasets = Vec::new();
    let mut ground_truth = Vec::new();
    for (name, content, sensitive) in fixtures {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        datasets.push(Dataset::from_csv_path(&path, 100).unwrap());
        ground_truth.push(GroundTruthRecord::new(
            *name,
            sensitive.iter().map(|c| c.to_string()).collect(),
        ));
    }
    (datasets, ground_truth)
}

#[test]
fn full_run_over_a_disk_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let (datasets, ground_truth) = build_corpus(dir.path());
    let config = AuditConfig::default();

    let (records, summary) = run_validation(&datasets, &ground_truth, &config).unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(summary.n_datasets, 4);
    assert!(summary.excluded_datasets.is_empty());

    // Name matching is clean on this corpus: age/race/sex/idade/gender and
    // marital_status all hit their keywords, and nothing else does.
    for record in &records {
        if record.dataset_id == "sensors.csv" {
            // Nothing sensitive, nothing detected: 0/0 -> 0 by convention.
            assert_eq!(record.f1, 0.0);
            assert_eq!(record.true_positives, 0);
            assert_eq!(record.false_positives, 0);
        } else {
            assert_eq!(record.f1, 1.0, "dataset {}", record.dataset_id);
        }
    }

    assert!(summary.f1_mean > 0.0);
    assert!(summary.f1_ci_95.0 <= summary.f1_mean);
    assert!(summary.f1_ci_95.1 >= summary.f1_mean);
}

#[test]
fn rerunning_a_corpus_produces_identical_records() {
    let dir = tempfile::tempdir().unwrap();
    let (datasets, ground_truth) = build_corpus(dir.path());
    let config = AuditConfig::default();

    let (first, _) = run_validation(&datasets, &ground_truth, &config).unwrap();
    let (second, _) = run_validation(&datasets, &ground_truth, &config).unwrap();
    assert_eq!(first, second);
}

/// Simulate a detector with an injected error rate: each truly-sensitive
/// column is dropped with probability `error_rate`, and a non-sensitive
/// column is added with the same probability.
fn detect_with_injected_error(
    dataset: &Dataset,
    truth: &GroundTruthRecord,
    error_rate: f64,
    rng: &mut StdRng,
) -> BTreeSet<String> {
    let mut detected = BTreeSet::new();
    for column in &truth.sensitive_columns {
        if rng.r#gen::<f64>() >= error_rate {
            detected.insert(column.clone());
        }
    }
    for column in &dataset.columns {
        if !truth.sensitive_columns.contains(column) && rng.r#gen::<f64>() < error_rate {
            detected.insert(column.clone());
        }
    }
    detected
}

#[test]
fn aggregation_over_noisy_detections_stays_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let (datasets, ground_truth) = build_corpus(dir.path());
    let mut rng = StdRng::seed_from_u64(42);

    let records: Vec<_> = datasets
        .iter()
        .zip(ground_truth.iter())
        .map(|(dataset, truth)| {
            let detected = detect_with_injected_error(dataset, truth, 0.10, &mut rng);
            score_detection(&detected, truth)
        })
        .collect();

    let summary = summarize(&records, Vec::new()).unwrap();
    assert_eq!(summary.n_datasets, 4);
    assert!((0.0..=1.0).contains(&summary.f1_mean));
    assert!((0.0..=1.0).contains(&summary.precision.mean));
    assert!((0.0..=1.0).contains(&summary.recall.mean));
    assert!(summary.f1_std >= 0.0);
}

#[test]
fn excluded_datasets_surface_in_the_summary() {
    let records = vec![
        score_detection(
            &["age"].iter().map(|c| c.to_string()).collect(),
            &GroundTruthRecord::new("a.csv", ["age"].iter().map(|c| c.to_string()).collect()),
        ),
        score_detection(
            &BTreeSet::new(),
            &GroundTruthRecord::new("b.csv", ["race"].iter().map(|c| c.to_string()).collect()),
        ),
    ];
    let excluded = vec![ExcludedDataset {
        dataset_id: "broken.csv".to_string(),
        reason: "Invalid input: broken.csv: empty CSV file".to_string(),
    }];

    let summary = summarize(&records, excluded).unwrap();
    assert_eq!(summary.n_datasets, 2);
    assert_eq!(summary.excluded_datasets.len(), 1);
    assert_eq!(summary.excluded_datasets[0].dataset_id, "broken.csv");
}

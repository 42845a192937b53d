//! Detection Validator: per-dataset scoring and corpus aggregation.
//!
//! Scoring compares one detection against one ground-truth record with set
//! arithmetic. Aggregation macro-averages across datasets, so a dataset
//! with many sensitive columns carries the same weight as one with few.
//! A single dataset's failure never aborts the corpus run: it lands in
//! `excluded_datasets` with its reason and the remainder aggregates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuditConfig;
use crate::corpus::Dataset;
use crate::detector::detect_columns;
use crate::error::AuditError;
use crate::ground_truth::GroundTruthRecord;
use crate::stats::{mean, sample_std, t_confidence_interval_95};

/// Per-dataset detection score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub dataset_id: String,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Score one detected set against one ground-truth record.
///
/// Division by zero follows the explicit 0/0 -> 0 convention, so a dataset
/// with nothing sensitive and nothing detected scores 0 across the board
/// rather than NaN.
pub fn score_detection(detected: &BTreeSet<String>, truth: &GroundTruthRecord) -> ScoreRecord {
    let tp = detected.intersection(&truth.sensitive_columns).count();
    let fp = detected.difference(&truth.sensitive_columns).count();
    let fn_ = truth.sensitive_columns.difference(detected).count();

    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ScoreRecord {
        dataset_id: truth.dataset_id.clone(),
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        precision,
        recall,
        f1,
    }
}

/// Macro-averaged statistics for one metric over a dataset collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub mean: f64,
    /// Sample standard deviation (N-1 denominator).
    pub std: f64,
    /// Two-sided 95% interval via Student's t, df = N-1. Raw bounds, not
    /// clipped to [0, 1].
    pub ci_95: (f64, f64),
}

/// Aggregate one metric's per-dataset values. Requires N >= 2.
pub fn aggregate(values: &[f64]) -> Result<AggregateMetrics, AuditError> {
    let ci_95 = t_confidence_interval_95(values)?;
    Ok(AggregateMetrics {
        mean: mean(values),
        std: sample_std(values),
        ci_95,
    })
}

/// Outcome of checking a "metric >= X" claim against an aggregate.
///
/// `passed` is driven by the mean alone, as the claim states; `marginal`
/// flags the case where the CI lower bound dips below the claim, so a
/// near-boundary pass is never reported as a clean one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCheck {
    pub claimed: f64,
    pub mean: f64,
    pub ci_lower: f64,
    pub passed: bool,
    pub marginal: bool,
}

pub fn validate_claim(metrics: &AggregateMetrics, claimed: f64) -> ClaimCheck {
    let passed = metrics.mean >= claimed;
    ClaimCheck {
        claimed,
        mean: metrics.mean,
        ci_lower: metrics.ci_95.0,
        passed,
        marginal: passed && metrics.ci_95.0 < claimed,
    }
}

/// A dataset dropped from aggregation, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedDataset {
    pub dataset_id: String,
    pub reason: String,
}

/// Corpus-level score summary for the report consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Count of datasets actually aggregated (exclusions not included).
    pub n_datasets: usize,
    pub precision: AggregateMetrics,
    pub recall: AggregateMetrics,
    pub f1_mean: f64,
    pub f1_std: f64,
    pub f1_ci_95: (f64, f64),
    pub excluded_datasets: Vec<ExcludedDataset>,
    pub generated_at: DateTime<Utc>,
}

/// Run detection and scoring over a corpus, then aggregate the survivors.
///
/// Configuration errors are fatal before any dataset is touched. Everything
/// after that is per-dataset: a malformed dataset, a detection failure, or
/// ground truth that does not match the dataset's columns excludes that one
/// dataset and the run continues. Aggregation still requires at least two
/// scored datasets.
pub fn run_validation(
    datasets: &[Dataset],
    ground_truth: &[GroundTruthRecord],
    config: &AuditConfig,
) -> Result<(Vec<ScoreRecord>, ScoreSummary), AuditError> {
    config.validate()?;

    let truth_by_id: BTreeMap<&str, &GroundTruthRecord> = ground_truth
        .iter()
        .map(|record| (record.dataset_id.as_str(), record))
        .collect();

    let mut records = Vec::new();
    let mut excluded = Vec::new();

    for dataset in datasets {
        let Some(truth) = truth_by_id.get(dataset.id.as_str()) else {
            tracing::warn!(dataset = %dataset.id, "no ground truth, excluding");
            excluded.push(ExcludedDataset {
                dataset_id: dataset.id.clone(),
                reason: "no ground truth record".to_string(),
            });
            continue;
        };

        if let Some(bad) = truth
            .sensitive_columns
            .iter()
            .find(|c| !dataset.columns.contains(c))
        {
            tracing::warn!(dataset = %dataset.id, column = %bad, "ground truth column not in dataset, excluding");
            excluded.push(ExcludedDataset {
                dataset_id: dataset.id.clone(),
                reason: format!("ground truth column '{bad}' not in dataset columns"),
            });
            continue;
        }

        match detect_columns(dataset, &config.detector) {
            Ok(detection) => {
                records.push(score_detection(&detection.flagged_columns(), truth));
            }
            Err(AuditError::Config(msg)) => {
                // A config error invalidates the whole run, not one dataset.
                return Err(AuditError::Config(msg));
            }
            Err(e) => {
                tracing::warn!(dataset = %dataset.id, error = %e, "detection failed, excluding");
                excluded.push(ExcludedDataset {
                    dataset_id: dataset.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let summary = summarize(&records, excluded)?;
    tracing::info!(
        n_datasets = summary.n_datasets,
        n_excluded = summary.excluded_datasets.len(),
        f1_mean = summary.f1_mean,
        "validation run complete"
    );
    Ok((records, summary))
}

/// Build the corpus summary from already-scored records.
pub fn summarize(
    records: &[ScoreRecord],
    excluded_datasets: Vec<ExcludedDataset>,
) -> Result<ScoreSummary, AuditError> {
    if records.len() < 2 {
        return Err(AuditError::insufficient_sample(format!(
            "aggregation requires at least 2 scored datasets, got {}",
            records.len()
        )));
    }

    let precisions: Vec<f64> = records.iter().map(|r| r.precision).collect();
    let recalls: Vec<f64> = records.iter().map(|r| r.recall).collect();
    let f1s: Vec<f64> = records.iter().map(|r| r.f1).collect();

    let f1 = aggregate(&f1s)?;
    Ok(ScoreSummary {
        n_datasets: records.len(),
        precision: aggregate(&precisions)?,
        recall: aggregate(&recalls)?,
        f1_mean: f1.mean,
        f1_std: f1.std,
        f1_ci_95: f1.ci_95,
        excluded_datasets,
        generated_at: Utc::now(),
    })
}

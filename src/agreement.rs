//! Inter-annotator agreement (Cohen's kappa).
//!
//! Every (dataset, column) pair in the shared corpus is one binary
//! sensitive/not-sensitive judgment per annotator. The 2x2 counts those
//! judgments form are kept on the record, so any reported kappa can be
//! recomputed by hand.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::ground_truth::Annotation;
use crate::stats::Z_95;
use crate::taxonomy::ProtectedCategory;

/// Both annotators' judgments of one dataset, with its column universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetJudgments {
    pub dataset_id: String,
    pub columns: Vec<String>,
    pub annotator_a: BTreeSet<String>,
    pub annotator_b: BTreeSet<String>,
}

impl DatasetJudgments {
    pub fn from_annotations(
        columns: Vec<String>,
        a: &Annotation,
        b: &Annotation,
    ) -> Result<Self, AuditError> {
        if a.dataset_id != b.dataset_id {
            return Err(AuditError::invalid_input(format!(
                "annotations cover different datasets: '{}' vs '{}'",
                a.dataset_id, b.dataset_id
            )));
        }
        let judgments = Self {
            dataset_id: a.dataset_id.clone(),
            columns,
            annotator_a: a.sensitive_columns.clone(),
            annotator_b: b.sensitive_columns.clone(),
        };
        judgments.check_universe()?;
        Ok(judgments)
    }

    fn check_universe(&self) -> Result<(), AuditError> {
        for set in [&self.annotator_a, &self.annotator_b] {
            for column in set {
                if !self.columns.iter().any(|c| c == column) {
                    return Err(AuditError::invalid_input(format!(
                        "{}: annotated column '{column}' not in the column universe",
                        self.dataset_id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The 2x2 contingency counts behind a binary kappa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCounts {
    pub both_sensitive: usize,
    pub only_first: usize,
    pub only_second: usize,
    pub neither: usize,
}

impl PairCounts {
    pub fn total(&self) -> usize {
        self.both_sensitive + self.only_first + self.only_second + self.neither
    }

    pub fn observed_agreement(&self) -> f64 {
        (self.both_sensitive + self.neither) as f64 / self.total() as f64
    }

    pub fn expected_agreement(&self) -> f64 {
        let n = self.total() as f64;
        let a_yes = (self.both_sensitive + self.only_first) as f64 / n;
        let b_yes = (self.both_sensitive + self.only_second) as f64 / n;
        a_yes * b_yes + (1.0 - a_yes) * (1.0 - b_yes)
    }

    pub fn kappa(&self) -> f64 {
        kappa_from_probabilities(self.observed_agreement(), self.expected_agreement())
    }
}

/// Chance-corrected agreement from observed and expected rates.
///
/// Po = Pe = 1 is perfect agreement with zero variance and is defined as
/// 1.0. Pe = 1 with Po < 1 leaves the denominator at zero; that case is
/// mathematically undefined and is reported as NaN rather than coerced.
pub fn kappa_from_probabilities(po: f64, pe: f64) -> f64 {
    if (1.0 - pe).abs() < f64::EPSILON {
        if (1.0 - po).abs() < f64::EPSILON {
            return 1.0;
        }
        return f64::NAN;
    }
    (po - pe) / (1.0 - pe)
}

/// Overall agreement result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementRecord {
    pub kappa: f64,
    /// Large-sample normal approximation. NaN bounds when kappa is NaN.
    pub ci_95: (f64, f64),
    pub counts: PairCounts,
    pub interpretation: String,
}

impl AgreementRecord {
    pub fn from_counts(counts: PairCounts) -> Result<Self, AuditError> {
        if counts.total() == 0 {
            return Err(AuditError::invalid_input(
                "agreement requires at least one (dataset, column) pair",
            ));
        }
        let kappa = counts.kappa();
        let ci_95 = kappa_ci_95(&counts);
        Ok(Self {
            kappa,
            ci_95,
            counts,
            interpretation: interpret_kappa(kappa).to_string(),
        })
    }
}

fn kappa_ci_95(counts: &PairCounts) -> (f64, f64) {
    let kappa = counts.kappa();
    if kappa.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    let n = counts.total() as f64;
    let po = counts.observed_agreement();
    let pe = counts.expected_agreement();
    if (1.0 - pe).abs() < f64::EPSILON {
        // Zero-variance perfect agreement.
        return (kappa, kappa);
    }
    let se = (po * (1.0 - po) / (n * (1.0 - pe).powi(2))).sqrt();
    (kappa - Z_95 * se, kappa + Z_95 * se)
}

/// Landis-Koch interpretation band for a kappa value.
pub fn interpret_kappa(kappa: f64) -> &'static str {
    if kappa.is_nan() {
        "undefined"
    } else if kappa < 0.0 {
        "poor"
    } else if kappa <= 0.20 {
        "slight"
    } else if kappa <= 0.40 {
        "fair"
    } else if kappa <= 0.60 {
        "moderate"
    } else if kappa <= 0.80 {
        "substantial"
    } else {
        "near-perfect"
    }
}

/// Fold per-dataset judgments into corpus-wide 2x2 counts.
pub fn pair_counts(judgments: &[DatasetJudgments]) -> Result<PairCounts, AuditError> {
    let mut counts = PairCounts::default();
    for judgment in judgments {
        judgment.check_universe()?;
        for column in &judgment.columns {
            let a = judgment.annotator_a.contains(column);
            let b = judgment.annotator_b.contains(column);
            match (a, b) {
                (true, true) => counts.both_sensitive += 1,
                (true, false) => counts.only_first += 1,
                (false, true) => counts.only_second += 1,
                (false, false) => counts.neither += 1,
            }
        }
    }
    Ok(counts)
}

/// One dataset the annotators disagreed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disagreement {
    pub dataset_id: String,
    pub annotator_a: Vec<String>,
    pub annotator_b: Vec<String>,
}

/// Per-category agreement, restricted to pairs where at least one annotator
/// assigned that category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAgreement {
    pub category: ProtectedCategory,
    pub kappa: f64,
    pub n_pairs: usize,
}

/// Corpus-level agreement report for the report consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementReport {
    pub n_datasets: usize,
    /// Overall kappa over all (dataset, column) pairs.
    pub mean_agreement: f64,
    pub ci_95: (f64, f64),
    pub counts: PairCounts,
    pub interpretation: String,
    pub per_category: Vec<CategoryAgreement>,
    pub disagreements: Vec<Disagreement>,
    pub generated_at: DateTime<Utc>,
}

/// Compute the full agreement report over the shared corpus.
///
/// `annotations` pairs each dataset's column universe with both annotators'
/// annotations of it.
pub fn agreement_report(
    annotations: &[(Vec<String>, Annotation, Annotation)],
) -> Result<AgreementReport, AuditError> {
    let mut judgments = Vec::with_capacity(annotations.len());
    for (columns, a, b) in annotations {
        judgments.push(DatasetJudgments::from_annotations(columns.clone(), a, b)?);
    }

    let counts = pair_counts(&judgments)?;
    let record = AgreementRecord::from_counts(counts)?;

    let disagreements = judgments
        .iter()
        .filter(|j| j.annotator_a != j.annotator_b)
        .map(|j| Disagreement {
            dataset_id: j.dataset_id.clone(),
            annotator_a: j.annotator_a.iter().cloned().collect(),
            annotator_b: j.annotator_b.iter().cloned().collect(),
        })
        .collect();

    let per_category = per_category_agreement(annotations);

    tracing::info!(
        n_datasets = judgments.len(),
        kappa = record.kappa,
        interpretation = %record.interpretation,
        "inter-annotator agreement computed"
    );

    Ok(AgreementReport {
        n_datasets: judgments.len(),
        mean_agreement: record.kappa,
        ci_95: record.ci_95,
        counts: record.counts,
        interpretation: record.interpretation,
        per_category,
        disagreements,
        generated_at: Utc::now(),
    })
}

fn per_category_agreement(
    annotations: &[(Vec<String>, Annotation, Annotation)],
) -> Vec<CategoryAgreement> {
    let mut results = Vec::new();
    for category in ProtectedCategory::ALL {
        let mut counts = PairCounts::default();
        for (columns, a, b) in annotations {
            for column in columns {
                let a_assigned = a.categories.get(column) == Some(&category);
                let b_assigned = b.categories.get(column) == Some(&category);
                match (a_assigned, b_assigned) {
                    (true, true) => counts.both_sensitive += 1,
                    (true, false) => counts.only_first += 1,
                    (false, true) => counts.only_second += 1,
                    // Pairs where neither annotator assigned the category
                    // are outside this category's scope.
                    (false, false) => {}
                }
            }
        }
        if counts.total() > 0 {
            results.push(CategoryAgreement {
                category,
                kappa: counts.kappa(),
                n_pairs: counts.total(),
            });
        }
    }
    results
}

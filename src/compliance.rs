//! Compliance Rule Engine: EEOC/ECOA disparate-impact rules.
//!
//! Outcome labels partitioned by the groups of one detected sensitive
//! attribute are checked against the 4/5 rule, statistical parity, and
//! (when ground-truth labels are available) equal opportunity. The verdict
//! is a strict conjunction: every configured rule must pass, and every
//! rule's statistic is reported whether it passed or not.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ComplianceConfig;
use crate::error::AuditError;

/// Outcome counts for one group of the sensitive attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcomes {
    pub group: String,
    /// Group population. Must be nonzero.
    pub total: usize,
    /// Favorable outcomes (selections/approvals) in this group.
    pub favorable: usize,
    /// Ground-truth-positive individuals in this group, when known.
    pub positives: Option<usize>,
    /// Favorable outcomes among the ground-truth positives, when known.
    pub true_positives: Option<usize>,
}

impl GroupOutcomes {
    pub fn new(group: impl Into<String>, total: usize, favorable: usize) -> Self {
        Self {
            group: group.into(),
            total,
            favorable,
            positives: None,
            true_positives: None,
        }
    }

    pub fn with_truth(mut self, positives: usize, true_positives: usize) -> Self {
        self.positives = Some(positives);
        self.true_positives = Some(true_positives);
        self
    }

    pub fn selection_rate(&self) -> f64 {
        self.favorable as f64 / self.total as f64
    }

    /// True-positive rate among ground-truth positives. Groups with no
    /// positives rate 0.0, matching the scoring convention.
    fn tpr(&self) -> Option<f64> {
        let positives = self.positives?;
        let true_positives = self.true_positives?;
        Some(if positives == 0 {
            0.0
        } else {
            true_positives as f64 / positives as f64
        })
    }
}

/// The rules the engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    FourFifths,
    StatisticalParity,
    EqualOpportunity,
}

/// One rule's computed statistic and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: RuleKind,
    pub statistic: f64,
    pub threshold: f64,
    /// False when the rule could not be evaluated (missing truth data);
    /// such a rule does not enter the verdict conjunction.
    pub evaluated: bool,
    pub passed: bool,
    pub failing_groups: Vec<String>,
}

/// The engine's verdict for one dataset and attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    pub dataset_id: String,
    pub attribute: String,
    pub selection_rates: BTreeMap<String, f64>,
    pub reference_group: String,
    /// Worst SR(g)/SR(reference) over groups meeting the size floor.
    pub disparate_impact_ratio: f64,
    /// Worst SR(g) - SR(reference); zero or negative by construction.
    pub statistical_parity_difference: f64,
    /// TPR spread across groups, when truth data was supplied.
    pub equal_opportunity_difference: Option<f64>,
    pub rules: Vec<RuleOutcome>,
    /// True when all selection rates are equal: no reference disparity is
    /// possible and the rate-based rules pass trivially.
    pub no_disparity: bool,
    pub compliant: bool,
}

/// Evaluate every rule for one dataset's grouped outcomes.
pub fn evaluate(
    dataset_id: &str,
    attribute: &str,
    groups: &[GroupOutcomes],
    config: &ComplianceConfig,
) -> Result<ComplianceVerdict, AuditError> {
    config.validate()?;
    if groups.len() < 2 {
        return Err(AuditError::invalid_input(format!(
            "{dataset_id}: compliance needs at least 2 groups, got {}",
            groups.len()
        )));
    }
    if let Some(empty) = groups.iter().find(|g| g.total == 0) {
        return Err(AuditError::degenerate_group(format!(
            "{dataset_id}: group '{}' has zero population",
            empty.group
        )));
    }

    let selection_rates: BTreeMap<String, f64> = groups
        .iter()
        .map(|g| (g.group.clone(), g.selection_rate()))
        .collect();

    // Reference group: highest selection rate; lexicographic order breaks
    // exact ties deterministically.
    let (reference_group, reference_rate) = selection_rates
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(g, r)| (g.clone(), *r))
        .unwrap_or_default();

    let no_disparity = selection_rates
        .values()
        .all(|r| (r - reference_rate).abs() < f64::EPSILON);

    let four_fifths = four_fifths_rule(groups, reference_rate, config);
    let parity = statistical_parity_rule(&selection_rates, reference_rate, config);
    let equal_opportunity = equal_opportunity_rule(groups, config);

    let disparate_impact_ratio = four_fifths.statistic;
    let statistical_parity_difference = parity.statistic;
    let equal_opportunity_difference = equal_opportunity
        .as_ref()
        .map(|rule| rule.statistic);

    let mut rules = vec![four_fifths, parity];
    if let Some(rule) = equal_opportunity {
        rules.push(rule);
    }

    let compliant = rules.iter().filter(|r| r.evaluated).all(|r| r.passed);

    tracing::debug!(
        dataset = dataset_id,
        attribute,
        reference = %reference_group,
        compliant,
        "compliance evaluated"
    );

    Ok(ComplianceVerdict {
        dataset_id: dataset_id.to_string(),
        attribute: attribute.to_string(),
        selection_rates,
        reference_group,
        disparate_impact_ratio,
        statistical_parity_difference,
        equal_opportunity_difference,
        rules,
        no_disparity,
        compliant,
    })
}

fn four_fifths_rule(
    groups: &[GroupOutcomes],
    reference_rate: f64,
    config: &ComplianceConfig,
) -> RuleOutcome {
    let mut worst_ratio = 1.0_f64;
    let mut failing_groups = Vec::new();

    for group in groups {
        if group.total < config.min_group_size {
            continue;
        }
        let ratio = if reference_rate > 0.0 {
            group.selection_rate() / reference_rate
        } else {
            // Nobody is selected anywhere; no group is disadvantaged.
            1.0
        };
        if ratio < worst_ratio {
            worst_ratio = ratio;
        }
        if ratio < config.four_fifths_threshold {
            failing_groups.push(group.group.clone());
        }
    }

    RuleOutcome {
        rule: RuleKind::FourFifths,
        statistic: worst_ratio,
        threshold: config.four_fifths_threshold,
        evaluated: true,
        passed: failing_groups.is_empty(),
        failing_groups,
    }
}

fn statistical_parity_rule(
    selection_rates: &BTreeMap<String, f64>,
    reference_rate: f64,
    config: &ComplianceConfig,
) -> RuleOutcome {
    let mut worst_difference = 0.0_f64;
    let mut failing_groups = Vec::new();

    for (group, rate) in selection_rates {
        let difference = rate - reference_rate;
        if difference < worst_difference {
            worst_difference = difference;
        }
        if difference.abs() > config.parity_threshold {
            failing_groups.push(group.clone());
        }
    }

    RuleOutcome {
        rule: RuleKind::StatisticalParity,
        statistic: worst_difference,
        threshold: config.parity_threshold,
        evaluated: true,
        passed: failing_groups.is_empty(),
        failing_groups,
    }
}

fn equal_opportunity_rule(
    groups: &[GroupOutcomes],
    config: &ComplianceConfig,
) -> Option<RuleOutcome> {
    let rates: Vec<(&str, f64)> = groups
        .iter()
        .map(|g| g.tpr().map(|tpr| (g.group.as_str(), tpr)))
        .collect::<Option<Vec<_>>>()?;

    let max_tpr = rates.iter().map(|(_, t)| *t).fold(f64::MIN, f64::max);
    let min_tpr = rates.iter().map(|(_, t)| *t).fold(f64::MAX, f64::min);
    let spread = max_tpr - min_tpr;

    let failing_groups = if spread > config.equal_opportunity_threshold {
        rates
            .iter()
            .filter(|(_, t)| max_tpr - t > config.equal_opportunity_threshold)
            .map(|(g, _)| g.to_string())
            .collect()
    } else {
        Vec::new()
    };

    Some(RuleOutcome {
        rule: RuleKind::EqualOpportunity,
        statistic: spread,
        threshold: config.equal_opportunity_threshold,
        evaluated: true,
        passed: spread <= config.equal_opportunity_threshold,
        failing_groups,
    })
}

/// One dataset's compliance input: the attribute and its grouped outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCase {
    pub dataset_id: String,
    pub attribute: String,
    pub groups: Vec<GroupOutcomes>,
}

/// Corpus-level compliance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Count of datasets actually evaluated (exclusions not included).
    pub n_datasets: usize,
    pub verdicts: Vec<ComplianceVerdict>,
    /// Fraction of evaluated datasets that are non-compliant.
    pub violation_rate: f64,
    pub excluded_datasets: Vec<crate::validator::ExcludedDataset>,
    pub generated_at: DateTime<Utc>,
}

/// Evaluate a corpus of compliance cases. Per-dataset failures (degenerate
/// groups, malformed inputs) are excluded and the run continues.
pub fn evaluate_corpus(
    cases: &[ComplianceCase],
    config: &ComplianceConfig,
) -> Result<ComplianceReport, AuditError> {
    config.validate()?;

    let mut verdicts = Vec::new();
    let mut excluded = Vec::new();
    for case in cases {
        match evaluate(&case.dataset_id, &case.attribute, &case.groups, config) {
            Ok(verdict) => verdicts.push(verdict),
            Err(e) => {
                tracing::warn!(dataset = %case.dataset_id, error = %e, "compliance evaluation failed, excluding");
                excluded.push(crate::validator::ExcludedDataset {
                    dataset_id: case.dataset_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let n_datasets = verdicts.len();
    let violations = verdicts.iter().filter(|v| !v.compliant).count();
    let violation_rate = if n_datasets > 0 {
        violations as f64 / n_datasets as f64
    } else {
        0.0
    };

    tracing::info!(
        n_datasets,
        n_excluded = excluded.len(),
        violation_rate,
        "compliance corpus evaluated"
    );

    Ok(ComplianceReport {
        n_datasets,
        verdicts,
        violation_rate,
        excluded_datasets: excluded,
        generated_at: Utc::now(),
    })
}

//! Attribute Matcher: fuzzy detection of sensitive columns.
//!
//! Column names are normalized and scored against the taxonomy keywords
//! with a longest-common-subsequence ratio; a column whose best score
//! clears the threshold is flagged with that keyword's category. A bounded
//! value sample can escalate columns whose names say nothing (pseudonymized
//! corpora). The matcher is deterministic: same input and threshold, same
//! output.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::corpus::Dataset;
use crate::error::AuditError;
use crate::taxonomy::{KEYWORDS, ProtectedCategory, VALUE_PATTERNS, VALUE_VOCABULARIES};

/// How a column came to be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEvidence {
    /// Name similarity cleared the threshold.
    Name,
    /// Sampled values fell inside a sensitive-value vocabulary.
    Values,
}

/// One flagged column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMatch {
    pub column: String,
    /// Best name-similarity score over all taxonomy keywords.
    pub score: f64,
    pub category: ProtectedCategory,
    pub evidence: MatchEvidence,
}

/// The matcher's output for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub dataset_id: String,
    pub matches: Vec<ColumnMatch>,
}

impl DetectionResult {
    pub fn flagged_columns(&self) -> BTreeSet<String> {
        self.matches.iter().map(|m| m.column.clone()).collect()
    }
}

/// Normalize a column name: lowercase, separators stripped.
pub fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect()
}

/// Longest-common-subsequence ratio: `2 * lcs(a, b) / (|a| + |b|)`.
/// 0.0 when either string is empty.
pub fn lcs_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(row[j])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }

    2.0 * prev[b.len()] as f64 / (a.len() + b.len()) as f64
}

/// Best score and category for a normalized column name.
///
/// A keyword contained outright in the name scores at least 0.9. Ties
/// resolve to the lowest taxonomy index because iteration is in taxonomy
/// order and only a strictly greater score replaces the best.
fn best_name_match(normalized: &str) -> (f64, ProtectedCategory) {
    let mut best_score = 0.0_f64;
    let mut best_category = ProtectedCategory::Race;
    for (category, keywords) in KEYWORDS {
        for keyword in *keywords {
            let mut score = lcs_ratio(normalized, keyword);
            if normalized.contains(keyword) {
                score = score.max(0.9);
            }
            if score > best_score {
                best_score = score;
                best_category = *category;
            }
        }
    }
    (best_score, best_category)
}

/// Category whose closed vocabulary (or value pattern) covers the sampled
/// values. Requires at least two distinct non-empty values for vocabulary
/// matches so constant or boolean-ish columns do not escalate.
fn value_match(values: &[&str]) -> Option<ProtectedCategory> {
    let distinct: BTreeSet<String> = values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    if distinct.is_empty() {
        return None;
    }

    for (category, vocabulary) in VALUE_VOCABULARIES {
        if distinct.len() >= 2 && distinct.iter().all(|v| vocabulary.contains(&v.as_str())) {
            return Some(*category);
        }
    }

    for (category, pattern) in VALUE_PATTERNS {
        if let Ok(re) = regex::Regex::new(pattern) {
            if distinct.iter().all(|v| re.is_match(v)) {
                return Some(*category);
            }
        }
    }

    None
}

/// Run the matcher over a dataset's columns (and, when enabled, its value
/// sample).
pub fn detect_columns(
    dataset: &Dataset,
    config: &DetectorConfig,
) -> Result<DetectionResult, AuditError> {
    config.validate()?;
    if dataset.columns.is_empty() {
        return Err(AuditError::invalid_input(format!(
            "{}: dataset has no columns",
            dataset.id
        )));
    }

    let mut matches = Vec::new();
    for column in &dataset.columns {
        let normalized = normalize(column);
        let (score, category) = best_name_match(&normalized);

        if score >= config.similarity_threshold {
            matches.push(ColumnMatch {
                column: column.clone(),
                score,
                category,
                evidence: MatchEvidence::Name,
            });
            continue;
        }

        if config.value_escalation {
            let values = dataset.column_values(column).unwrap_or_default();
            let bounded = &values[..values.len().min(config.value_sample_rows)];
            if let Some(category) = value_match(bounded) {
                tracing::debug!(
                    dataset = %dataset.id,
                    column = %column,
                    category = category.label(),
                    "column escalated on value vocabulary"
                );
                matches.push(ColumnMatch {
                    column: column.clone(),
                    score,
                    category,
                    evidence: MatchEvidence::Values,
                });
            }
        }
    }

    tracing::debug!(
        dataset = %dataset.id,
        flagged = matches.len(),
        total = dataset.columns.len(),
        "attribute detection complete"
    );

    Ok(DetectionResult {
        dataset_id: dataset.id.clone(),
        matches,
    })
}

/// Convenience entry for callers that only hold column names.
pub fn detect_names(
    dataset_id: &str,
    columns: &[String],
    config: &DetectorConfig,
) -> Result<DetectionResult, AuditError> {
    detect_columns(&Dataset::new(dataset_id, columns.to_vec()), config)
}

//! Ground-truth annotations and their consolidation.
//!
//! Annotation files are JSON objects keyed by dataset id, one file per
//! annotator, with parallel `sensitive_columns`/`sensitive_categories`
//! arrays. Two annotators' sets consolidate into one reference record per
//! dataset by intersection: a column only one annotator flagged is exactly
//! the disagreement the agreement calculator measures, and does not enter
//! the reference (see DESIGN.md).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::Dataset;
use crate::error::AuditError;
use crate::taxonomy::ProtectedCategory;

/// One annotator's judgment of one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub dataset_id: String,
    pub annotator_id: u32,
    pub sensitive_columns: BTreeSet<String>,
    /// Category per column, where the annotator assigned one of the nine
    /// codes. Columns marked `other`/`unknown` carry no entry.
    pub categories: BTreeMap<String, ProtectedCategory>,
}

impl Annotation {
    /// Check that every annotated column exists in the dataset.
    pub fn check_against(&self, dataset: &Dataset) -> Result<(), AuditError> {
        for column in &self.sensitive_columns {
            if !dataset.columns.iter().any(|c| c == column) {
                return Err(AuditError::invalid_input(format!(
                    "{}: annotated column '{column}' not in dataset columns",
                    self.dataset_id
                )));
            }
        }
        Ok(())
    }
}

/// Consolidated sensitive-column reference for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthRecord {
    pub dataset_id: String,
    pub sensitive_columns: BTreeSet<String>,
    pub n_sensitive: usize,
}

impl GroundTruthRecord {
    pub fn new(dataset_id: impl Into<String>, sensitive_columns: BTreeSet<String>) -> Self {
        let n_sensitive = sensitive_columns.len();
        Self {
            dataset_id: dataset_id.into(),
            sensitive_columns,
            n_sensitive,
        }
    }
}

/// On-disk annotation entry (the annotator tool's output shape).
#[derive(Debug, Clone, Deserialize)]
struct AnnotationEntry {
    sensitive_columns: Vec<String>,
    #[serde(default)]
    sensitive_categories: Vec<String>,
}

/// All of one annotator's annotations, keyed by dataset id.
#[derive(Debug, Clone)]
pub struct AnnotationSet {
    pub annotator_id: u32,
    annotations: BTreeMap<String, Annotation>,
}

impl AnnotationSet {
    pub fn from_json_str(annotator_id: u32, content: &str) -> Result<Self, AuditError> {
        let entries: BTreeMap<String, AnnotationEntry> = serde_json::from_str(content)?;
        let annotations = entries
            .into_iter()
            .map(|(dataset_id, entry)| {
                let categories = entry
                    .sensitive_columns
                    .iter()
                    .zip(entry.sensitive_categories.iter())
                    .filter_map(|(column, label)| {
                        ProtectedCategory::from_label(label).map(|c| (column.clone(), c))
                    })
                    .collect();
                let annotation = Annotation {
                    dataset_id: dataset_id.clone(),
                    annotator_id,
                    sensitive_columns: entry.sensitive_columns.into_iter().collect(),
                    categories,
                };
                (dataset_id, annotation)
            })
            .collect();
        Ok(Self {
            annotator_id,
            annotations,
        })
    }

    pub fn from_json_path(annotator_id: u32, path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(annotator_id, &content)
    }

    pub fn get(&self, dataset_id: &str) -> Option<&Annotation> {
        self.annotations.get(dataset_id)
    }

    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.annotations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// Consolidate two annotators' judgments of one dataset by intersection.
pub fn consolidate(a: &Annotation, b: &Annotation) -> Result<GroundTruthRecord, AuditError> {
    if a.dataset_id != b.dataset_id {
        return Err(AuditError::invalid_input(format!(
            "cannot consolidate annotations of '{}' and '{}'",
            a.dataset_id, b.dataset_id
        )));
    }
    let agreed: BTreeSet<String> = a
        .sensitive_columns
        .intersection(&b.sensitive_columns)
        .cloned()
        .collect();
    Ok(GroundTruthRecord::new(a.dataset_id.clone(), agreed))
}

/// Consolidate over the datasets both annotators covered.
pub fn consolidate_sets(
    a: &AnnotationSet,
    b: &AnnotationSet,
) -> Result<Vec<GroundTruthRecord>, AuditError> {
    let mut records = Vec::new();
    for (dataset_id, annotation_a) in &a.annotations {
        if let Some(annotation_b) = b.get(dataset_id) {
            records.push(consolidate(annotation_a, annotation_b)?);
        }
    }
    Ok(records)
}

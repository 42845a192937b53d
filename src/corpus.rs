//! Dataset corpus access.
//!
//! Datasets arrive as CSV files (header + rows). The audit core only needs
//! the header, the row count, and a bounded sample of values for the
//! escalation checks, so loading keeps at most `sample_rows` rows in memory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// A tabular dataset addressed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    /// Ordered column names, as they appear in the header.
    pub columns: Vec<String>,
    /// The outcome/label column, when one is known.
    pub target: Option<String>,
    /// Total data rows in the source file.
    pub row_count: usize,
    /// Up to the configured number of data rows, in file order.
    pub sample: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a dataset directly from parts. Intended for callers that
    /// already hold tabular data in memory.
    pub fn new(id: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            id: id.into(),
            columns,
            target: None,
            row_count: 0,
            sample: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Parse CSV content. The first line is the header; `sample_rows` bounds
    /// how many data rows are retained (all rows are still counted).
    pub fn from_csv_str(
        id: impl Into<String>,
        content: &str,
        sample_rows: usize,
    ) -> Result<Self, AuditError> {
        let id = id.into();
        let mut lines = content.lines();

        let columns: Vec<String> = lines
            .next()
            .ok_or_else(|| AuditError::invalid_input(format!("{id}: empty CSV file")))?
            .split(',')
            .map(|s| s.trim().trim_matches('"').to_string())
            .collect();

        if columns.iter().all(|c| c.is_empty()) {
            return Err(AuditError::invalid_input(format!(
                "{id}: CSV header has no column names"
            )));
        }

        let mut sample = Vec::new();
        let mut row_count = 0;
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            row_count += 1;
            if sample.len() < sample_rows {
                let row: Vec<String> = line
                    .split(',')
                    .map(|s| s.trim().trim_matches('"').to_string())
                    .collect();
                sample.push(row);
            }
        }

        // The conventional label column name in the corpus.
        let target = columns.iter().find(|c| c.as_str() == "target").cloned();

        Ok(Self {
            id,
            columns,
            target,
            row_count,
            sample,
        })
    }

    /// Load a CSV file; the dataset id is the file name.
    pub fn from_csv_path(path: impl AsRef<Path>, sample_rows: usize) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let content = std::fs::read_to_string(path)?;
        Self::from_csv_str(id, &content, sample_rows)
    }

    /// Sampled values of one column, in row order. `None` if the column
    /// does not exist.
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(
            self.sample
                .iter()
                .filter_map(|row| row.get(idx).map(String::as_str))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CSV: &str = "\
name,age,gender,target
alice,34,F,1
bob,29,M,0
carol,41,F,1
";

    #[test]
    fn test_parse_header_and_rows() {
        let ds = Dataset::from_csv_str("adult.csv", CSV, 100).unwrap();
        assert_eq!(ds.columns, vec!["name", "age", "gender", "target"]);
        assert_eq!(ds.row_count, 3);
        assert_eq!(ds.sample.len(), 3);
        assert_eq!(ds.target.as_deref(), Some("target"));
    }

    #[test]
    fn test_sample_is_bounded_but_rows_are_counted() {
        let ds = Dataset::from_csv_str("adult.csv", CSV, 2).unwrap();
        assert_eq!(ds.sample.len(), 2);
        assert_eq!(ds.row_count, 3);
    }

    #[test]
    fn test_column_values() {
        let ds = Dataset::from_csv_str("adult.csv", CSV, 100).unwrap();
        assert_eq!(ds.column_values("gender").unwrap(), vec!["F", "M", "F"]);
        assert!(ds.column_values("missing").is_none());
    }

    #[test]
    fn test_empty_file_is_invalid_input() {
        assert!(matches!(
            Dataset::from_csv_str("empty.csv", "", 100),
            Err(AuditError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_quoted_header_cells_are_stripped() {
        let ds = Dataset::from_csv_str("q.csv", "\"a\",\"b\"\n1,2\n", 100).unwrap();
        assert_eq!(ds.columns, vec!["a", "b"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credit.csv");
        std::fs::write(&path, CSV).unwrap();
        let ds = Dataset::from_csv_path(&path, 100).unwrap();
        assert_eq!(ds.id, "credit.csv");
        assert_eq!(ds.row_count, 3);
    }
}

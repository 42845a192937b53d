//! Configuration types for audit runs.
//!
//! All thresholds are serde-deserializable with defaults, so a run can be
//! configured from a JSON/TOML fragment or built in code. Parameters are
//! validated once at run start; an out-of-range value invalidates the whole
//! run's comparability and is therefore fatal.

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Top-level configuration for an audit run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Attribute matcher configuration.
    #[serde(default)]
    pub detector: DetectorConfig,
    /// Compliance rule engine configuration.
    #[serde(default)]
    pub compliance: ComplianceConfig,
}

impl AuditConfig {
    /// Validate every parameter. Call once before a corpus run.
    pub fn validate(&self) -> Result<(), AuditError> {
        self.detector.validate()?;
        self.compliance.validate()
    }
}

/// Attribute matcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Similarity threshold for flagging a column, in (0, 1].
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Enable value-vocabulary escalation for pseudonymized column names.
    #[serde(default = "default_true")]
    pub value_escalation: bool,
    /// Maximum data rows sampled per dataset for value escalation.
    #[serde(default = "default_value_sample_rows")]
    pub value_sample_rows: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            value_escalation: true,
            value_sample_rows: default_value_sample_rows(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), AuditError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(AuditError::config(format!(
                "similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

fn default_similarity_threshold() -> f64 {
    0.75
}

fn default_value_sample_rows() -> usize {
    100
}

fn default_true() -> bool {
    true
}

/// Compliance rule engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Minimum disparate-impact ratio under the 4/5 rule.
    #[serde(default = "default_four_fifths_threshold")]
    pub four_fifths_threshold: f64,
    /// Maximum absolute statistical-parity difference.
    #[serde(default = "default_parity_threshold")]
    pub parity_threshold: f64,
    /// Maximum equal-opportunity (TPR) difference.
    #[serde(default = "default_equal_opportunity_threshold")]
    pub equal_opportunity_threshold: f64,
    /// Groups below this population are excluded from the 4/5 rule.
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            four_fifths_threshold: default_four_fifths_threshold(),
            parity_threshold: default_parity_threshold(),
            equal_opportunity_threshold: default_equal_opportunity_threshold(),
            min_group_size: default_min_group_size(),
        }
    }
}

impl ComplianceConfig {
    pub fn validate(&self) -> Result<(), AuditError> {
        if !(self.four_fifths_threshold > 0.0 && self.four_fifths_threshold <= 1.0) {
            return Err(AuditError::config(format!(
                "four_fifths_threshold must be in (0, 1], got {}",
                self.four_fifths_threshold
            )));
        }
        if !(self.parity_threshold > 0.0 && self.parity_threshold < 1.0) {
            return Err(AuditError::config(format!(
                "parity_threshold must be in (0, 1), got {}",
                self.parity_threshold
            )));
        }
        if !(self.equal_opportunity_threshold > 0.0 && self.equal_opportunity_threshold < 1.0) {
            return Err(AuditError::config(format!(
                "equal_opportunity_threshold must be in (0, 1), got {}",
                self.equal_opportunity_threshold
            )));
        }
        if self.min_group_size == 0 {
            return Err(AuditError::config("min_group_size must be at least 1"));
        }
        Ok(())
    }
}

fn default_four_fifths_threshold() -> f64 {
    0.8
}

fn default_parity_threshold() -> f64 {
    0.2
}

fn default_equal_opportunity_threshold() -> f64 {
    0.1
}

fn default_min_group_size() -> usize {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuditConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.similarity_threshold, 0.75);
        assert_eq!(config.compliance.four_fifths_threshold, 0.8);
    }

    #[test]
    fn test_threshold_out_of_range_is_config_error() {
        let mut config = AuditConfig::default();
        config.detector.similarity_threshold = 0.0;
        assert!(matches!(
            config.validate(),
            Err(AuditError::Config(_))
        ));

        config.detector.similarity_threshold = 1.5;
        assert!(matches!(config.validate(), Err(AuditError::Config(_))));
    }

    #[test]
    fn test_compliance_parameters_validated() {
        let mut config = ComplianceConfig::default();
        config.min_group_size = 0;
        assert!(config.validate().is_err());

        let mut config = ComplianceConfig::default();
        config.parity_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AuditConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.detector.value_sample_rows, 100);
        assert_eq!(config.compliance.min_group_size, 30);
    }
}

//! # fairaudit — sensitive-attribute detection validation & compliance
//!
//! This crate validates an automated sensitive-attribute detector for
//! tabular datasets against human-annotated ground truth, and checks the
//! detected attributes for EEOC/ECOA fairness compliance.
//!
//! ## Components
//!
//! - [`detector`]: fuzzy-matches column names (and optionally sampled
//!   values) against the protected-category [`taxonomy`]
//! - [`validator`]: scores detections against ground truth per dataset and
//!   macro-averages across a corpus with t-distribution confidence intervals
//! - [`agreement`]: Cohen's kappa between two annotators, validating
//!   ground-truth quality
//! - [`compliance`]: the 4/5 rule, statistical parity, and equal
//!   opportunity over outcome rates grouped by a sensitive attribute
//!
//! All four are independent, stateless computations: each produces a fresh
//! immutable record set per run, and a single dataset's failure is recorded
//! in `excluded_datasets` rather than aborting a corpus run.

pub mod agreement;
pub mod compliance;
pub mod config;
pub mod corpus;
pub mod detector;
pub mod error;
pub mod ground_truth;
pub mod stats;
pub mod taxonomy;
pub mod validator;

pub use agreement::{AgreementRecord, AgreementReport, PairCounts, agreement_report};
pub use compliance::{
    ComplianceCase, ComplianceReport, ComplianceVerdict, GroupOutcomes, RuleKind, evaluate,
    evaluate_corpus,
};
pub use config::{AuditConfig, ComplianceConfig, DetectorConfig};
pub use corpus::Dataset;
pub use detector::{ColumnMatch, DetectionResult, MatchEvidence, detect_columns, detect_names};
pub use error::AuditError;
pub use ground_truth::{Annotation, AnnotationSet, GroundTruthRecord, consolidate_sets};
pub use taxonomy::ProtectedCategory;
pub use validator::{
    AggregateMetrics, ClaimCheck, ExcludedDataset, ScoreRecord, ScoreSummary, run_validation,
    score_detection, validate_claim,
};

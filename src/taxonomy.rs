//! Protected-attribute taxonomy (EEOC/ECOA categories).
//!
//! The nine categories, their column-name keywords, and the closed value
//! vocabularies used for escalation are fixed: the matcher is a pure
//! function of its inputs and this table. Keyword lists include the
//! Portuguese variants present in the annotated corpus.

use serde::{Deserialize, Serialize};

/// A protected category under EEOC/ECOA guidance.
///
/// Declaration order is the taxonomy order: score ties during detection
/// resolve to the earliest variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProtectedCategory {
    Race,
    Gender,
    Age,
    Religion,
    Disability,
    Nationality,
    Marital,
    Veteran,
    Orientation,
}

impl ProtectedCategory {
    /// All categories in taxonomy order.
    pub const ALL: [ProtectedCategory; 9] = [
        ProtectedCategory::Race,
        ProtectedCategory::Gender,
        ProtectedCategory::Age,
        ProtectedCategory::Religion,
        ProtectedCategory::Disability,
        ProtectedCategory::Nationality,
        ProtectedCategory::Marital,
        ProtectedCategory::Veteran,
        ProtectedCategory::Orientation,
    ];

    /// Short machine label, as used in annotation files.
    pub fn label(&self) -> &'static str {
        match self {
            ProtectedCategory::Race => "race",
            ProtectedCategory::Gender => "gender",
            ProtectedCategory::Age => "age",
            ProtectedCategory::Religion => "religion",
            ProtectedCategory::Disability => "disability",
            ProtectedCategory::Nationality => "nationality",
            ProtectedCategory::Marital => "marital",
            ProtectedCategory::Veteran => "veteran",
            ProtectedCategory::Orientation => "orientation",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            ProtectedCategory::Race => "Race/Ethnicity",
            ProtectedCategory::Gender => "Gender/Sex",
            ProtectedCategory::Age => "Age",
            ProtectedCategory::Religion => "Religion",
            ProtectedCategory::Disability => "Disability Status",
            ProtectedCategory::Nationality => "National Origin",
            ProtectedCategory::Marital => "Marital Status",
            ProtectedCategory::Veteran => "Veteran Status",
            ProtectedCategory::Orientation => "Sexual Orientation",
        }
    }

    /// Parse a machine label back into a category. Unknown labels (the
    /// annotation tool also emits `other`/`unknown`) return `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

/// Column-name keywords per category, matched fuzzily by the detector.
pub(crate) static KEYWORDS: &[(ProtectedCategory, &[&str])] = &[
    (
        ProtectedCategory::Race,
        &["race", "ethnicity", "ethnic", "raca", "etnia", "color"],
    ),
    (
        ProtectedCategory::Gender,
        &["gender", "sex", "genero", "sexo", "male", "female"],
    ),
    (
        ProtectedCategory::Age,
        &["age", "birth", "birthday", "anos", "idade", "dob"],
    ),
    (
        ProtectedCategory::Religion,
        &["religion", "religious", "faith", "religiao"],
    ),
    (
        ProtectedCategory::Disability,
        &["disability", "disabled", "handicap", "deficiencia"],
    ),
    (
        ProtectedCategory::Nationality,
        &["nationality", "national", "country", "nation"],
    ),
    (
        ProtectedCategory::Marital,
        &["marital", "married", "marriage", "civil"],
    ),
    (
        ProtectedCategory::Veteran,
        &["veteran", "military", "service"],
    ),
    (
        ProtectedCategory::Orientation,
        &["orientation", "sexual", "lgbt"],
    ),
];

/// Closed value vocabularies. A column whose sampled values all fall inside
/// one vocabulary is flagged for that category even when its name says
/// nothing (pseudonymized corpora).
pub(crate) static VALUE_VOCABULARIES: &[(ProtectedCategory, &[&str])] = &[
    (
        ProtectedCategory::Gender,
        &["m", "f", "male", "female", "masculino", "feminino"],
    ),
    (
        ProtectedCategory::Race,
        &[
            "white",
            "black",
            "asian",
            "hispanic",
            "latino",
            "indigenous",
            "branco",
            "preto",
            "pardo",
            "amarelo",
        ],
    ),
    (
        ProtectedCategory::Marital,
        &["single", "married", "divorced", "widowed", "separated"],
    ),
];

/// Value patterns that escalate a column on their own, regardless of the
/// column name. Currently dates of birth.
pub(crate) static VALUE_PATTERNS: &[(ProtectedCategory, &str)] = &[(
    ProtectedCategory::Age,
    r"^\d{4}[-/]\d{2}[-/]\d{2}$",
)];

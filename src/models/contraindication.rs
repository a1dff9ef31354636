use serde::{Deserialize, Serialize};

use super::enums::{ContraindicationKind, ContraindicationSeverity};

/// Static (medication, condition) contraindication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContraindicationRecord {
    pub medication: String,
    pub condition_code: String,
    pub kind: ContraindicationKind,
    pub severity: ContraindicationSeverity,
    pub rationale: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub evidence_level: Option<String>,
}

/// A patient condition, ICD-10 coded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRef {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ConditionRef {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
        }
    }

    /// ICD codes compare upper-cased and trimmed.
    pub fn normalized_code(&self) -> String {
        normalize_code(&self.code)
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

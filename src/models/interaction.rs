use serde::{Deserialize, Serialize};

use super::enums::InteractionSeverity;

/// Stored drug-drug interaction. The pair is unordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub drug_a: String,
    #[serde(default)]
    pub drug_a_code: Option<String>,
    pub drug_b: String,
    #[serde(default)]
    pub drug_b_code: Option<String>,
    pub severity: InteractionSeverity,
    pub description: String,
    pub recommended_action: String,
}

impl InteractionRecord {
    /// Whether this record covers the (unordered) pair of names.
    pub fn involves(&self, a: &str, b: &str) -> bool {
        let (x, y) = (self.drug_a.to_lowercase(), self.drug_b.to_lowercase());
        let (a, b) = (a.to_lowercase(), b.to_lowercase());
        (x == a && y == b) || (x == b && y == a)
    }

    /// Whether this record covers the (unordered) pair of RxNorm codes.
    pub fn involves_codes(&self, a: &str, b: &str) -> bool {
        match (self.drug_a_code.as_deref(), self.drug_b_code.as_deref()) {
            (Some(x), Some(y)) => (x == a && y == b) || (x == b && y == a),
            _ => false,
        }
    }
}

use serde::{Deserialize, Serialize};

use super::enums::AllergySeverity;

/// A documented allergy. Patient-specific when `patient_id` is set,
/// otherwise a catalogue entry describing the allergen in general.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergyRecord {
    #[serde(default)]
    pub patient_id: Option<String>,
    pub allergen: String,
    #[serde(default)]
    pub allergen_class: Option<String>,
    pub severity: AllergySeverity,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub cross_reactive_classes: Vec<String>,
}

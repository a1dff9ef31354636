use serde::{Deserialize, Serialize};

use super::enums::PediatricFormula;

/// Therapeutic dose window for a (medication, route) pair, with the
/// patient-specific adjustment rules that apply to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticRange {
    pub medication: String,
    pub route: String,
    pub min_dose: f64,
    pub max_dose: f64,
    pub unit: String,
    #[serde(default)]
    pub max_daily_dose: Option<f64>,
    #[serde(default)]
    pub pediatric: Option<PediatricRule>,
    #[serde(default)]
    pub geriatric: Option<GeriatricRule>,
    #[serde(default)]
    pub renal: Option<RenalRule>,
    #[serde(default)]
    pub hepatic: Option<HepaticRule>,
    #[serde(default)]
    pub monitoring: Vec<String>,
}

/// Pediatric scaling. Without an explicit formula the validator picks one
/// from the patient's age.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PediatricRule {
    #[serde(default)]
    pub formula: Option<PediatricFormula>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeriatricRule {
    /// Percent taken off the maximum dose for patients 65 and older.
    pub max_reduction_percent: f64,
    #[serde(default)]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenalRule {
    /// GFR (mL/min/1.73m²) below which the reduction applies.
    pub gfr_threshold: f64,
    pub reduction_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HepaticRule {
    pub recommendation: String,
}

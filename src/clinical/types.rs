use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::enums::{
    serialize_severity_or_none, AllergySeverity, ContraindicationKind, ContraindicationSeverity,
    InteractionSeverity, PediatricFormula,
};

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionAlert {
    pub medication_a: String,
    pub medication_b: String,
    pub severity: InteractionSeverity,
    pub description: String,
    pub recommended_action: String,
    pub blocks_administration: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResult {
    pub alerts: Vec<InteractionAlert>,
    pub has_alerts: bool,
    #[serde(serialize_with = "serialize_severity_or_none")]
    pub highest_severity: Option<InteractionSeverity>,
    pub pairs_checked: usize,
}

// ---------------------------------------------------------------------------
// Allergies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllergyAlertKind {
    /// Medication name equals the allergen.
    DirectMatch,
    /// Medication class is known to cross-react with the allergen class.
    CrossReactivity,
    /// Medication belongs to the same class as the allergen.
    ClassWarning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyAlert {
    pub medication: String,
    pub allergen: String,
    #[serde(rename = "type")]
    pub kind: AllergyAlertKind,
    pub severity: AllergySeverity,
    pub blocks_administration: bool,
    pub drug_class: Option<String>,
    pub allergen_class: Option<String>,
    pub risk_percent: Option<f64>,
    pub reaction: Option<String>,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyCheckResult {
    pub alerts: Vec<AllergyAlert>,
    pub has_alerts: bool,
    #[serde(serialize_with = "serialize_severity_or_none")]
    pub highest_severity: Option<AllergySeverity>,
    pub blocks_administration: bool,
}

// ---------------------------------------------------------------------------
// Contraindications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContraindicationAlert {
    pub medication: String,
    pub condition_code: String,
    pub condition_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ContraindicationKind,
    pub severity: ContraindicationSeverity,
    pub rationale: String,
    pub alternatives: Vec<String>,
    pub evidence_level: Option<String>,
    pub recommendation: String,
    pub blocks_administration: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContraindicationResult {
    pub absolute_contraindications: Vec<ContraindicationAlert>,
    pub relative_contraindications: Vec<ContraindicationAlert>,
    pub has_contraindications: bool,
    pub blocks_administration: bool,
    #[serde(serialize_with = "serialize_severity_or_none")]
    pub highest_severity: Option<ContraindicationSeverity>,
}

// ---------------------------------------------------------------------------
// Dose validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DoseStatus {
    Ok,
    BelowRange,
    AboveRange,
    SubTherapeutic,
    Toxic,
}

impl DoseStatus {
    /// Statuses that count as errors in the aggregate result.
    pub fn is_error(self) -> bool {
        matches!(self, Self::AboveRange | Self::Toxic)
    }
}

/// Effective window a dose was classified against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSummary {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseValidation {
    pub medication: String,
    pub prescribed_dose: String,
    pub route: String,
    pub status: DoseStatus,
    pub is_valid: bool,
    /// Prescribed dose expressed in the range unit.
    pub converted_dose: Option<f64>,
    pub therapeutic_range: Option<RangeSummary>,
    pub adjusted_dose: Option<f64>,
    pub adjustment_reasons: Vec<String>,
    pub pediatric_formula: Option<PediatricFormula>,
    pub renal_adjustment_percent: Option<f64>,
    pub daily_dose: Option<f64>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DoseValidation {
    pub(crate) fn new(medication: &str, dose: &str, route: &str) -> Self {
        Self {
            medication: medication.to_string(),
            prescribed_dose: dose.to_string(),
            route: route.to_string(),
            status: DoseStatus::Ok,
            is_valid: true,
            converted_dose: None,
            therapeutic_range: None,
            adjusted_dose: None,
            adjustment_reasons: Vec::new(),
            pediatric_formula: None,
            renal_adjustment_percent: None,
            daily_dose: None,
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseValidationResult {
    pub validations: Vec<DoseValidation>,
    pub has_errors: bool,
    pub has_warnings: bool,
}

// ---------------------------------------------------------------------------
// Combined report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedReport {
    pub interactions: InteractionResult,
    pub allergies: AllergyCheckResult,
    pub contraindications: ContraindicationResult,
    pub doses: DoseValidationResult,
    pub processing_time_ms: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a reference-data lookup. A record that simply does not exist
/// is `Ok(None)` at the store level, never one of these.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Reference database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Reference store unavailable: {0}")]
    Unavailable(String),

    #[error("Reference lookup timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum CdsError {
    #[error("Reference lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Invalid dose format: {0}")]
    InvalidDoseFormat(String),

    #[error("Cannot convert {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    #[error("{check} check timed out after {timeout_ms} ms")]
    Timeout { check: &'static str, timeout_ms: u64 },

    #[error("{check} check task failed: {reason}")]
    TaskFailed { check: &'static str, reason: String },

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),
}

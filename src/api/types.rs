//! Shared types for the HTTP layer: router state, the success envelope and
//! request bodies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::clinical::{CdsService, FullCheckInput};
use crate::models::{ConditionRef, MedicationRef, PatientProfile, Prescription, DEFAULT_ROUTE};

// ---------------------------------------------------------------------------
// API context
// ---------------------------------------------------------------------------

/// Shared state for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub service: Arc<CdsService>,
}

impl ApiContext {
    pub fn new(service: Arc<CdsService>) -> Self {
        Self { service }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A medication as submitted by a client. `dose` is only needed for dose
/// validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedMedication {
    #[serde(flatten)]
    pub medication: MedicationRef,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
}

impl RequestedMedication {
    fn to_prescription(&self) -> Option<Prescription> {
        let dose = self.dose.as_ref()?;
        Some(Prescription {
            medication: self.medication.clone(),
            dose: dose.clone(),
            frequency: self.frequency.clone(),
            route: self
                .route
                .clone()
                .unwrap_or_else(|| DEFAULT_ROUTE.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionRef>,
    #[serde(flatten)]
    pub profile: PatientProfile,
}

/// Body shared by every check route. Each route reads the parts it needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub medications: Vec<RequestedMedication>,
    #[serde(default)]
    pub patient_context: PatientContext,
}

impl CheckRequest {
    pub fn medication_refs(&self) -> Vec<MedicationRef> {
        self.medications.iter().map(|m| m.medication.clone()).collect()
    }

    /// Every medication must carry a dose.
    pub fn prescriptions(&self) -> Result<Vec<Prescription>, ApiError> {
        self.medications
            .iter()
            .map(|m| {
                m.to_prescription().ok_or_else(|| {
                    ApiError::BadRequest(format!("Medication '{}' has no dose", m.medication.name))
                })
            })
            .collect()
    }

    /// Medications without a dose are skipped by dose validation.
    pub fn into_full_check(self) -> FullCheckInput {
        let prescriptions = self
            .medications
            .iter()
            .filter_map(RequestedMedication::to_prescription)
            .collect();
        let medications = self.medication_refs();
        let PatientContext {
            patient_id,
            allergies,
            conditions,
            profile,
        } = self.patient_context;

        FullCheckInput {
            medications,
            prescriptions,
            allergens: allergies,
            patient_id,
            conditions,
            patient: profile,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub dose: String,
    pub to_unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_request_reads_patient_context() {
        let req: CheckRequest = serde_json::from_str(
            r#"{
                "medications": [
                    {"name": "Amoxicillin", "rxNormCode": "723", "dose": "500 mg", "frequency": "TID"},
                    {"name": "Warfarin"}
                ],
                "patientContext": {
                    "patientId": "patient-001",
                    "allergies": ["penicillin"],
                    "conditions": [{"code": "N18.5"}],
                    "ageYears": 70,
                    "gfr": 25
                }
            }"#,
        )
        .unwrap();

        assert_eq!(req.medications.len(), 2);
        assert_eq!(req.patient_context.profile.age_years, Some(70.0));
        assert_eq!(req.patient_context.profile.gfr, Some(25.0));

        let input = req.clone().into_full_check();
        assert_eq!(input.medications.len(), 2);
        assert_eq!(input.prescriptions.len(), 1);
        assert_eq!(input.prescriptions[0].route, DEFAULT_ROUTE);
        assert_eq!(input.patient_id.as_deref(), Some("patient-001"));
        assert_eq!(input.conditions[0].code, "N18.5");
    }

    #[test]
    fn dose_route_requires_every_dose() {
        let req: CheckRequest =
            serde_json::from_str(r#"{"medications": [{"name": "Warfarin"}]}"#).unwrap();
        assert!(matches!(req.prescriptions(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn patient_context_is_optional() {
        let req: CheckRequest =
            serde_json::from_str(r#"{"medications": []}"#).unwrap();
        assert!(req.patient_context.allergies.is_empty());
        assert!(req.patient_context.profile.age_years.is_none());
    }
}

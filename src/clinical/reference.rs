use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{CdsError, LookupError};
use crate::models::{
    normalize_code, normalize_name, AllergyRecord, ContraindicationRecord, InteractionRecord,
    MedicationRef, TherapeuticRange,
};

/// Read-only clinical reference data, injected into every checker.
///
/// Each lookup distinguishes "no such record" (`Ok(None)`) from a failed
/// lookup (`Err`). Implementations must never fold an error into `Ok(None)`.
pub trait ReferenceStore: Send + Sync {
    /// Pharmacological class recorded for a medication name.
    fn drug_class(&self, medication: &str) -> Result<Option<String>, LookupError>;

    /// Interaction for the unordered pair, matched by name or RxNorm code.
    fn find_interaction(
        &self,
        a: &MedicationRef,
        b: &MedicationRef,
    ) -> Result<Option<InteractionRecord>, LookupError>;

    /// Allergen record, preferring the patient's own entry when `patient_id`
    /// is supplied.
    fn find_allergy(
        &self,
        allergen: &str,
        patient_id: Option<&str>,
    ) -> Result<Option<AllergyRecord>, LookupError>;

    fn find_contraindication(
        &self,
        medication: &str,
        condition_code: &str,
    ) -> Result<Option<ContraindicationRecord>, LookupError>;

    fn find_therapeutic_range(
        &self,
        medication: &str,
        route: &str,
    ) -> Result<Option<TherapeuticRange>, LookupError>;
}

/// On-disk JSON form of a reference data set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceBundle {
    /// medication name -> class name
    #[serde(default)]
    pub drug_classes: HashMap<String, String>,
    #[serde(default)]
    pub interactions: Vec<InteractionRecord>,
    #[serde(default)]
    pub allergies: Vec<AllergyRecord>,
    #[serde(default)]
    pub contraindications: Vec<ContraindicationRecord>,
    #[serde(default)]
    pub therapeutic_ranges: Vec<TherapeuticRange>,
}

/// Lock-free store over a JSON bundle. Keys are normalized once at load.
pub struct InMemoryReferenceStore {
    drug_classes: HashMap<String, String>,
    interactions: Vec<InteractionRecord>,
    allergies: Vec<AllergyRecord>,
    contraindications: HashMap<(String, String), ContraindicationRecord>,
    therapeutic_ranges: HashMap<(String, String), TherapeuticRange>,
}

impl InMemoryReferenceStore {
    pub fn from_bundle(bundle: ReferenceBundle) -> Self {
        let drug_classes = bundle
            .drug_classes
            .into_iter()
            .map(|(med, class)| (normalize_name(&med), normalize_name(&class)))
            .collect();

        let contraindications = bundle
            .contraindications
            .into_iter()
            .map(|r| ((normalize_name(&r.medication), normalize_code(&r.condition_code)), r))
            .collect();

        let therapeutic_ranges = bundle
            .therapeutic_ranges
            .into_iter()
            .map(|r| ((normalize_name(&r.medication), normalize_name(&r.route)), r))
            .collect();

        Self {
            drug_classes,
            interactions: bundle.interactions,
            allergies: bundle.allergies,
            contraindications,
            therapeutic_ranges,
        }
    }

    /// Load a reference bundle from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, CdsError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CdsError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        let bundle: ReferenceBundle = serde_json::from_str(&raw).map_err(|e| {
            CdsError::ReferenceDataParse(path.display().to_string(), e.to_string())
        })?;
        tracing::info!(
            path = %path.display(),
            interactions = bundle.interactions.len(),
            allergies = bundle.allergies.len(),
            contraindications = bundle.contraindications.len(),
            ranges = bundle.therapeutic_ranges.len(),
            "Loaded reference bundle"
        );
        Ok(Self::from_bundle(bundle))
    }

    /// Fixture store built from the sample bundle shipped in `resources/`.
    #[cfg(test)]
    pub fn load_test() -> Self {
        let bundle: ReferenceBundle = serde_json::from_str(include_str!(
            "../../resources/reference/sample_bundle.json"
        ))
        .expect("sample bundle parses");
        Self::from_bundle(bundle)
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn drug_class(&self, medication: &str) -> Result<Option<String>, LookupError> {
        Ok(self.drug_classes.get(&normalize_name(medication)).cloned())
    }

    fn find_interaction(
        &self,
        a: &MedicationRef,
        b: &MedicationRef,
    ) -> Result<Option<InteractionRecord>, LookupError> {
        let found = self
            .interactions
            .iter()
            .filter(|r| {
                r.involves(a.name.trim(), b.name.trim())
                    || matches!(
                        (a.rx_norm_code.as_deref(), b.rx_norm_code.as_deref()),
                        (Some(x), Some(y)) if r.involves_codes(x, y)
                    )
            })
            .max_by_key(|r| r.severity);
        Ok(found.cloned())
    }

    fn find_allergy(
        &self,
        allergen: &str,
        patient_id: Option<&str>,
    ) -> Result<Option<AllergyRecord>, LookupError> {
        let allergen = normalize_name(allergen);
        let is_match = |r: &AllergyRecord| normalize_name(&r.allergen) == allergen;

        let found = patient_id
            .and_then(|pid| {
                self.allergies
                    .iter()
                    .find(|r| is_match(*r) && r.patient_id.as_deref() == Some(pid))
            })
            .or_else(|| {
                self.allergies
                    .iter()
                    .find(|r| is_match(*r) && r.patient_id.is_none())
            });
        Ok(found.cloned())
    }

    fn find_contraindication(
        &self,
        medication: &str,
        condition_code: &str,
    ) -> Result<Option<ContraindicationRecord>, LookupError> {
        let key = (normalize_name(medication), normalize_code(condition_code));
        Ok(self.contraindications.get(&key).cloned())
    }

    fn find_therapeutic_range(
        &self,
        medication: &str,
        route: &str,
    ) -> Result<Option<TherapeuticRange>, LookupError> {
        let key = (normalize_name(medication), normalize_name(route));
        Ok(self.therapeutic_ranges.get(&key).cloned())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Store double whose every lookup fails.
    pub struct FailingStore;

    impl ReferenceStore for FailingStore {
        fn drug_class(&self, _: &str) -> Result<Option<String>, LookupError> {
            Err(LookupError::Unavailable("store offline".into()))
        }

        fn find_interaction(
            &self,
            _: &MedicationRef,
            _: &MedicationRef,
        ) -> Result<Option<InteractionRecord>, LookupError> {
            Err(LookupError::Unavailable("store offline".into()))
        }

        fn find_allergy(
            &self,
            _: &str,
            _: Option<&str>,
        ) -> Result<Option<AllergyRecord>, LookupError> {
            Err(LookupError::Unavailable("store offline".into()))
        }

        fn find_contraindication(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<ContraindicationRecord>, LookupError> {
            Err(LookupError::Unavailable("store offline".into()))
        }

        fn find_therapeutic_range(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<TherapeuticRange>, LookupError> {
            Err(LookupError::Unavailable("store offline".into()))
        }
    }

    /// Store that sleeps before answering from the fixture data.
    pub struct SlowStore {
        pub inner: InMemoryReferenceStore,
        pub delay: std::time::Duration,
    }

    impl SlowStore {
        fn pause(&self) {
            std::thread::sleep(self.delay);
        }
    }

    impl ReferenceStore for SlowStore {
        fn drug_class(&self, medication: &str) -> Result<Option<String>, LookupError> {
            self.pause();
            self.inner.drug_class(medication)
        }

        fn find_interaction(
            &self,
            a: &MedicationRef,
            b: &MedicationRef,
        ) -> Result<Option<InteractionRecord>, LookupError> {
            self.pause();
            self.inner.find_interaction(a, b)
        }

        fn find_allergy(
            &self,
            allergen: &str,
            patient_id: Option<&str>,
        ) -> Result<Option<AllergyRecord>, LookupError> {
            self.pause();
            self.inner.find_allergy(allergen, patient_id)
        }

        fn find_contraindication(
            &self,
            medication: &str,
            condition_code: &str,
        ) -> Result<Option<ContraindicationRecord>, LookupError> {
            self.pause();
            self.inner.find_contraindication(medication, condition_code)
        }

        fn find_therapeutic_range(
            &self,
            medication: &str,
            route: &str,
        ) -> Result<Option<TherapeuticRange>, LookupError> {
            self.pause();
            self.inner.find_therapeutic_range(medication, route)
        }
    }
}

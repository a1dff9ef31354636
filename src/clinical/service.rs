use std::sync::Arc;
use std::time::{Duration, Instant};

use super::allergies::AllergyChecker;
use super::classifier::{ChainedClassifier, DrugClassifier};
use super::contraindications::ContraindicationScreener;
use super::dosing::DoseRangeValidator;
use super::interactions::InteractionMatcher;
use super::reference::ReferenceStore;
use super::types::{
    AllergyCheckResult, CdsError, CombinedReport, ContraindicationResult, DoseValidationResult,
    InteractionResult,
};
use crate::models::{ConditionRef, MedicationRef, PatientProfile, Prescription};

/// Everything `check_all` needs in one place.
#[derive(Debug, Clone, Default)]
pub struct FullCheckInput {
    pub medications: Vec<MedicationRef>,
    /// Subset of the medications that carry a dose.
    pub prescriptions: Vec<Prescription>,
    pub allergens: Vec<String>,
    pub patient_id: Option<String>,
    pub conditions: Vec<ConditionRef>,
    pub patient: PatientProfile,
}

/// Async front for the four checkers. Each check runs on the blocking pool,
/// bounded by `lookup_timeout`.
pub struct CdsService {
    interactions: Arc<InteractionMatcher>,
    allergies: Arc<AllergyChecker>,
    contraindications: Arc<ContraindicationScreener>,
    doses: Arc<DoseRangeValidator>,
    lookup_timeout: Duration,
}

impl CdsService {
    pub fn new(
        store: Arc<dyn ReferenceStore>,
        classifier: Arc<dyn DrugClassifier>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            interactions: Arc::new(InteractionMatcher::new(store.clone())),
            allergies: Arc::new(AllergyChecker::new(store.clone(), classifier)),
            contraindications: Arc::new(ContraindicationScreener::new(store.clone())),
            doses: Arc::new(DoseRangeValidator::new(store)),
            lookup_timeout,
        }
    }

    /// Service with the lookup-table-then-heuristic classifier chain.
    pub fn with_store(store: Arc<dyn ReferenceStore>, lookup_timeout: Duration) -> Self {
        let classifier = Arc::new(ChainedClassifier::table_then_heuristic(store.clone()));
        Self::new(store, classifier, lookup_timeout)
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Run `f` on the blocking pool. On timeout the caller gets
    /// `CdsError::Timeout` but the closure keeps running detached until it
    /// returns; with `SqliteReferenceStore` it holds the connection mutex
    /// until then, so later checks queue behind it.
    async fn run_blocking<T, F>(&self, check: &'static str, f: F) -> Result<T, CdsError>
    where
        F: FnOnce() -> Result<T, CdsError> + Send + 'static,
        T: Send + 'static,
    {
        let timeout_ms = self.lookup_timeout.as_millis() as u64;
        match tokio::time::timeout(self.lookup_timeout, tokio::task::spawn_blocking(f)).await {
            Err(_) => {
                tracing::warn!(check, timeout_ms, "Check timed out");
                Err(CdsError::Timeout { check, timeout_ms })
            }
            Ok(Err(join_err)) => {
                tracing::error!(check, error = %join_err, "Check task failed");
                Err(CdsError::TaskFailed {
                    check,
                    reason: join_err.to_string(),
                })
            }
            Ok(Ok(result)) => {
                if let Err(e) = &result {
                    tracing::error!(check, error = %e, "Check failed");
                }
                result
            }
        }
    }

    pub async fn check_interactions(
        &self,
        medications: Vec<MedicationRef>,
    ) -> Result<InteractionResult, CdsError> {
        let matcher = self.interactions.clone();
        self.run_blocking("interaction", move || {
            matcher.check_interactions(&medications)
        })
        .await
    }

    pub async fn check_allergies(
        &self,
        medications: Vec<MedicationRef>,
        allergens: Vec<String>,
        patient_id: Option<String>,
    ) -> Result<AllergyCheckResult, CdsError> {
        let checker = self.allergies.clone();
        self.run_blocking("allergy", move || {
            checker.check_allergies(&medications, &allergens, patient_id.as_deref())
        })
        .await
    }

    pub async fn check_contraindications(
        &self,
        medications: Vec<MedicationRef>,
        conditions: Vec<ConditionRef>,
    ) -> Result<ContraindicationResult, CdsError> {
        let screener = self.contraindications.clone();
        self.run_blocking("contraindication", move || {
            screener.check_contraindications(&medications, &conditions)
        })
        .await
    }

    pub async fn validate_doses(
        &self,
        prescriptions: Vec<Prescription>,
        patient: PatientProfile,
    ) -> Result<DoseValidationResult, CdsError> {
        let validator = self.doses.clone();
        self.run_blocking("dose", move || {
            validator.validate_doses(&prescriptions, &patient)
        })
        .await
    }

    /// Run all four checks concurrently. The first failure fails the report.
    pub async fn check_all(&self, input: FullCheckInput) -> Result<CombinedReport, CdsError> {
        let start = Instant::now();
        let FullCheckInput {
            medications,
            prescriptions,
            allergens,
            patient_id,
            conditions,
            patient,
        } = input;

        let (interactions, allergies, contraindications, doses) = tokio::try_join!(
            self.check_interactions(medications.clone()),
            self.check_allergies(medications.clone(), allergens, patient_id),
            self.check_contraindications(medications, conditions),
            self.validate_doses(prescriptions, patient),
        )?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            interaction_alerts = interactions.alerts.len(),
            allergy_alerts = allergies.alerts.len(),
            contraindications = contraindications.absolute_contraindications.len()
                + contraindications.relative_contraindications.len(),
            dose_errors = doses.has_errors,
            processing_ms = processing_time_ms,
            "Full check complete"
        );

        Ok(CombinedReport {
            interactions,
            allergies,
            contraindications,
            doses,
            processing_time_ms,
        })
    }
}

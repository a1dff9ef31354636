use std::sync::Arc;
use std::time::Instant;

use super::classifier::DrugClassifier;
use super::cross_reactivity;
use super::messages::MessageTemplates;
use super::reference::ReferenceStore;
use super::types::{AllergyAlert, AllergyAlertKind, AllergyCheckResult, CdsError};
use crate::models::enums::{highest, AllergySeverity};
use crate::models::{normalize_name, MedicationRef};

/// Severity assumed for a direct match when no allergy record exists.
const UNRECORDED_DIRECT_MATCH_SEVERITY: AllergySeverity = AllergySeverity::Severe;

/// Allergen as resolved against the reference store.
struct ResolvedAllergen {
    name: String,
    normalized: String,
    class: Option<String>,
    severity: AllergySeverity,
    reaction: Option<String>,
    cross_reactive_classes: Vec<String>,
}

/// Screens medications against a patient's allergens: direct matches,
/// cross-reactive classes, and same-class warnings.
pub struct AllergyChecker {
    store: Arc<dyn ReferenceStore>,
    classifier: Arc<dyn DrugClassifier>,
}

impl AllergyChecker {
    pub fn new(store: Arc<dyn ReferenceStore>, classifier: Arc<dyn DrugClassifier>) -> Self {
        Self { store, classifier }
    }

    pub fn check_allergies(
        &self,
        medications: &[MedicationRef],
        allergens: &[String],
        patient_id: Option<&str>,
    ) -> Result<AllergyCheckResult, CdsError> {
        let start = Instant::now();
        if allergens.is_empty() || medications.is_empty() {
            return Ok(summarize(Vec::new()));
        }

        let resolved = allergens
            .iter()
            .map(|a| self.resolve_allergen(a, patient_id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut alerts = Vec::new();
        for med in medications {
            let med_name = med.normalized_name();
            let med_class = self.classifier.classify(&med.name)?.map(|c| c.name);

            for allergen in &resolved {
                if med_name == allergen.normalized {
                    alerts.push(direct_match(med, allergen, med_class.clone()));
                }

                let Some(class) = med_class.as_deref() else {
                    tracing::debug!(
                        medication = %med.name,
                        allergen = %allergen.name,
                        "Medication class unknown; skipping class-level allergy checks"
                    );
                    continue;
                };

                alerts.extend(cross_reactivity_alert(med, class, allergen));
                alerts.extend(class_warning(med, class, allergen));
            }
        }

        let result = summarize(alerts);
        tracing::info!(
            medications = medications.len(),
            allergens = allergens.len(),
            alerts = result.alerts.len(),
            highest = result.highest_severity.map(|s| s.as_str()).unwrap_or("none"),
            blocks = result.blocks_administration,
            processing_ms = start.elapsed().as_millis() as u64,
            "Allergy check complete"
        );
        Ok(result)
    }

    fn resolve_allergen(
        &self,
        allergen: &str,
        patient_id: Option<&str>,
    ) -> Result<ResolvedAllergen, CdsError> {
        let record = self.store.find_allergy(allergen, patient_id)?;
        let class = match record.as_ref().and_then(|r| r.allergen_class.clone()) {
            Some(class) => Some(normalize_name(&class)),
            None => self.classifier.classify(allergen)?.map(|c| c.name),
        };

        Ok(match record {
            Some(r) => ResolvedAllergen {
                name: allergen.to_string(),
                normalized: normalize_name(allergen),
                class,
                severity: r.severity,
                reaction: r.reaction,
                cross_reactive_classes: r
                    .cross_reactive_classes
                    .iter()
                    .map(|c| normalize_name(c))
                    .collect(),
            },
            None => ResolvedAllergen {
                name: allergen.to_string(),
                normalized: normalize_name(allergen),
                class,
                severity: UNRECORDED_DIRECT_MATCH_SEVERITY,
                reaction: None,
                cross_reactive_classes: Vec::new(),
            },
        })
    }
}

fn direct_match(
    med: &MedicationRef,
    allergen: &ResolvedAllergen,
    med_class: Option<String>,
) -> AllergyAlert {
    AllergyAlert {
        medication: med.name.clone(),
        allergen: allergen.name.clone(),
        kind: AllergyAlertKind::DirectMatch,
        severity: allergen.severity,
        blocks_administration: severity_blocks(allergen.severity),
        drug_class: med_class,
        allergen_class: allergen.class.clone(),
        risk_percent: None,
        reaction: allergen.reaction.clone(),
        message: MessageTemplates::allergy_direct(&med.name, &allergen.name),
        recommendation: MessageTemplates::do_not_administer(&med.name),
    }
}

/// Medication class cross-reacts with the allergen's class, either through
/// the static table or the allergy record's own list.
fn cross_reactivity_alert(
    med: &MedicationRef,
    med_class: &str,
    allergen: &ResolvedAllergen,
) -> Option<AllergyAlert> {
    let allergen_class = allergen.class.as_deref();
    let table_entry = allergen_class.and_then(|ac| cross_reactivity::lookup(med_class, ac));
    let listed = allergen.cross_reactive_classes.iter().any(|c| c == med_class);
    if table_entry.is_none() && !listed {
        return None;
    }

    let risk_percent = table_entry.and_then(|e| e.risk_percent);
    let message = MessageTemplates::allergy_cross_reactive(
        &med.name,
        med_class,
        &allergen.name,
        allergen_class.unwrap_or("unknown class"),
        risk_percent,
    );
    Some(class_level_alert(
        med,
        med_class,
        allergen,
        AllergyAlertKind::CrossReactivity,
        risk_percent,
        message,
    ))
}

fn class_warning(
    med: &MedicationRef,
    med_class: &str,
    allergen: &ResolvedAllergen,
) -> Option<AllergyAlert> {
    if allergen.class.as_deref() != Some(med_class) {
        return None;
    }
    let message = MessageTemplates::allergy_same_class(&med.name, med_class, &allergen.name);
    Some(class_level_alert(
        med,
        med_class,
        allergen,
        AllergyAlertKind::ClassWarning,
        None,
        message,
    ))
}

/// Class-level alerts are fixed at moderate.
fn class_level_alert(
    med: &MedicationRef,
    med_class: &str,
    allergen: &ResolvedAllergen,
    kind: AllergyAlertKind,
    risk_percent: Option<f64>,
    message: String,
) -> AllergyAlert {
    let severity = AllergySeverity::Moderate;
    AllergyAlert {
        medication: med.name.clone(),
        allergen: allergen.name.clone(),
        kind,
        severity,
        blocks_administration: severity_blocks(severity),
        drug_class: Some(med_class.to_string()),
        allergen_class: allergen.class.clone(),
        risk_percent,
        reaction: allergen.reaction.clone(),
        message,
        recommendation: MessageTemplates::use_with_allergy_caution(&med.name),
    }
}

fn severity_blocks(severity: AllergySeverity) -> bool {
    severity >= AllergySeverity::Severe
}

fn summarize(alerts: Vec<AllergyAlert>) -> AllergyCheckResult {
    let highest_severity = highest(alerts.iter().map(|a| a.severity));
    AllergyCheckResult {
        has_alerts: !alerts.is_empty(),
        blocks_administration: alerts.iter().any(|a| a.blocks_administration),
        highest_severity,
        alerts,
    }
}

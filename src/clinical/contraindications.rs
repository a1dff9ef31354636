use std::sync::Arc;
use std::time::Instant;

use super::messages::MessageTemplates;
use super::reference::ReferenceStore;
use super::types::{CdsError, ContraindicationAlert, ContraindicationResult};
use crate::models::enums::{highest, ContraindicationKind, ContraindicationSeverity};
use crate::models::{ConditionRef, ContraindicationRecord, MedicationRef};

/// Screens medications against a patient's ICD-10 coded conditions.
pub struct ContraindicationScreener {
    store: Arc<dyn ReferenceStore>,
}

impl ContraindicationScreener {
    pub fn new(store: Arc<dyn ReferenceStore>) -> Self {
        Self { store }
    }

    pub fn check_contraindications(
        &self,
        medications: &[MedicationRef],
        conditions: &[ConditionRef],
    ) -> Result<ContraindicationResult, CdsError> {
        let start = Instant::now();
        let mut absolute = Vec::new();
        let mut relative = Vec::new();

        for med in medications {
            for condition in conditions {
                let Some(record) = self
                    .store
                    .find_contraindication(&med.name, &condition.normalized_code())?
                else {
                    continue;
                };
                let alert = build_alert(med, condition, record);
                match alert.kind {
                    ContraindicationKind::Absolute => absolute.push(alert),
                    ContraindicationKind::Relative => relative.push(alert),
                }
            }
        }

        let all = absolute.iter().chain(relative.iter());
        let highest_severity = highest(all.clone().map(|a| a.severity));
        let blocks_administration = all.clone().any(|a| a.blocks_administration);
        let has_contraindications = !absolute.is_empty() || !relative.is_empty();

        tracing::info!(
            medications = medications.len(),
            conditions = conditions.len(),
            absolute = absolute.len(),
            relative = relative.len(),
            highest = highest_severity.map(|s| s.as_str()).unwrap_or("none"),
            blocks = blocks_administration,
            processing_ms = start.elapsed().as_millis() as u64,
            "Contraindication check complete"
        );

        Ok(ContraindicationResult {
            absolute_contraindications: absolute,
            relative_contraindications: relative,
            has_contraindications,
            blocks_administration,
            highest_severity,
        })
    }
}

/// Absolute always blocks; relative blocks from `severe` upward.
pub fn blocks_administration(kind: ContraindicationKind, severity: ContraindicationSeverity) -> bool {
    match kind {
        ContraindicationKind::Absolute => true,
        ContraindicationKind::Relative => severity >= ContraindicationSeverity::Severe,
    }
}

fn recommendation(med: &MedicationRef, record: &ContraindicationRecord) -> String {
    match record.kind {
        ContraindicationKind::Absolute if !record.alternatives.is_empty() => {
            MessageTemplates::contraindicated_with_alternatives(&med.name, &record.alternatives)
        }
        ContraindicationKind::Absolute => {
            MessageTemplates::contraindicated(&med.name, &record.rationale)
        }
        ContraindicationKind::Relative => {
            MessageTemplates::use_with_caution(&med.name, &record.rationale)
        }
    }
}

fn build_alert(
    med: &MedicationRef,
    condition: &ConditionRef,
    record: ContraindicationRecord,
) -> ContraindicationAlert {
    ContraindicationAlert {
        medication: med.name.clone(),
        condition_code: condition.normalized_code(),
        condition_name: condition.name.clone(),
        recommendation: recommendation(med, &record),
        blocks_administration: blocks_administration(record.kind, record.severity),
        kind: record.kind,
        severity: record.severity,
        rationale: record.rationale,
        alternatives: record.alternatives,
        evidence_level: record.evidence_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::reference::test_support::FailingStore;
    use crate::clinical::reference::InMemoryReferenceStore;

    fn screener() -> ContraindicationScreener {
        ContraindicationScreener::new(Arc::new(InMemoryReferenceStore::load_test()))
    }

    fn meds(names: &[&str]) -> Vec<MedicationRef> {
        names.iter().map(|n| MedicationRef::new(*n)).collect()
    }

    fn conditions(codes: &[&str]) -> Vec<ConditionRef> {
        codes.iter().map(|c| ConditionRef::new(*c)).collect()
    }

    #[test]
    fn empty_condition_list_has_no_alerts() {
        let result = screener()
            .check_contraindications(&meds(&["metformin"]), &[])
            .unwrap();
        assert!(!result.has_contraindications);
        assert!(!result.blocks_administration);
        assert_eq!(result.highest_severity, None);
    }

    #[test]
    fn blocking_rule() {
        use ContraindicationKind::*;
        use ContraindicationSeverity::*;
        for severity in [Mild, Moderate, Severe, Critical] {
            assert!(blocks_administration(Absolute, severity));
        }
        assert!(!blocks_administration(Relative, Mild));
        assert!(!blocks_administration(Relative, Moderate));
        assert!(blocks_administration(Relative, Severe));
        assert!(blocks_administration(Relative, Critical));
    }

    #[test]
    fn absolute_with_alternatives() {
        let result = screener()
            .check_contraindications(&meds(&["Metformin"]), &conditions(&["n18.5"]))
            .unwrap();
        assert_eq!(result.absolute_contraindications.len(), 1);
        assert!(result.relative_contraindications.is_empty());
        let alert = &result.absolute_contraindications[0];
        assert_eq!(alert.condition_code, "N18.5");
        assert_eq!(
            alert.recommendation,
            "Do not use Metformin. Consider alternatives: insulin, linagliptin."
        );
        assert!(result.blocks_administration);
        assert_eq!(result.highest_severity, Some(ContraindicationSeverity::Critical));
    }

    #[test]
    fn absolute_blocks_regardless_of_severity() {
        let result = screener()
            .check_contraindications(&meds(&["lisinopril"]), &conditions(&["T78.3"]))
            .unwrap();
        let alert = &result.absolute_contraindications[0];
        assert_eq!(alert.severity, ContraindicationSeverity::Moderate);
        assert!(alert.blocks_administration);
        assert!(result.blocks_administration);
        assert_eq!(
            alert.recommendation,
            "Do not use lisinopril. History of angioedema."
        );
    }

    #[test]
    fn relative_moderate_warns_without_blocking() {
        let result = screener()
            .check_contraindications(&meds(&["ibuprofen"]), &conditions(&["I50.9"]))
            .unwrap();
        assert!(result.has_contraindications);
        assert_eq!(result.relative_contraindications.len(), 1);
        assert!(!result.blocks_administration);
        assert!(result.relative_contraindications[0]
            .recommendation
            .starts_with("Use ibuprofen with caution."));
    }

    #[test]
    fn relative_severe_blocks() {
        let result = screener()
            .check_contraindications(&meds(&["metformin"]), &conditions(&["N18.4"]))
            .unwrap();
        assert!(result.blocks_administration);
    }

    #[test]
    fn partitions_across_medications() {
        let result = screener()
            .check_contraindications(
                &meds(&["metformin", "ibuprofen", "warfarin"]),
                &conditions(&["N18.5", "I50.9", "Z00.0"]),
            )
            .unwrap();
        assert_eq!(result.absolute_contraindications.len(), 1);
        assert_eq!(result.relative_contraindications.len(), 1);
        assert_eq!(result.highest_severity, Some(ContraindicationSeverity::Critical));
    }

    #[test]
    fn condition_name_carried_through() {
        let condition = ConditionRef {
            code: "I50.9".into(),
            name: Some("Heart failure".into()),
        };
        let result = screener()
            .check_contraindications(&meds(&["ibuprofen"]), &[condition])
            .unwrap();
        assert_eq!(
            result.relative_contraindications[0].condition_name.as_deref(),
            Some("Heart failure")
        );
    }

    #[test]
    fn lookup_failure_fails_the_check() {
        let err = ContraindicationScreener::new(Arc::new(FailingStore))
            .check_contraindications(&meds(&["metformin"]), &conditions(&["N18.5"]))
            .unwrap_err();
        assert!(matches!(err, CdsError::Lookup(_)));
    }
}

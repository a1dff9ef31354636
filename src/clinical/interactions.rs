use std::sync::Arc;
use std::time::Instant;

use super::reference::ReferenceStore;
use super::types::{CdsError, InteractionAlert, InteractionResult};
use crate::models::enums::{highest, InteractionSeverity};
use crate::models::MedicationRef;

/// Pairwise drug-drug interaction screening.
pub struct InteractionMatcher {
    store: Arc<dyn ReferenceStore>,
}

impl InteractionMatcher {
    pub fn new(store: Arc<dyn ReferenceStore>) -> Self {
        Self { store }
    }

    /// Look up every unordered pair once. Any failed lookup fails the whole
    /// check.
    pub fn check_interactions(
        &self,
        medications: &[MedicationRef],
    ) -> Result<InteractionResult, CdsError> {
        let start = Instant::now();
        let mut alerts = Vec::new();
        let mut pairs_checked = 0usize;

        for (i, a) in medications.iter().enumerate() {
            for b in &medications[i + 1..] {
                pairs_checked += 1;
                if let Some(record) = self.store.find_interaction(a, b)? {
                    alerts.push(InteractionAlert {
                        medication_a: a.name.clone(),
                        medication_b: b.name.clone(),
                        severity: record.severity,
                        description: record.description,
                        recommended_action: record.recommended_action,
                        blocks_administration: record.severity >= InteractionSeverity::Major,
                    });
                }
            }
        }

        let highest_severity = highest(alerts.iter().map(|a| a.severity));

        tracing::info!(
            medications = medications.len(),
            pairs_checked,
            alerts = alerts.len(),
            highest = highest_severity.map(|s| s.as_str()).unwrap_or("none"),
            processing_ms = start.elapsed().as_millis() as u64,
            "Interaction check complete"
        );

        Ok(InteractionResult {
            has_alerts: !alerts.is_empty(),
            alerts,
            highest_severity,
            pairs_checked,
        })
    }
}

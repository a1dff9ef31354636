use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use super::dose::{self, format_amount, parse_dose, DoseUnit};
use super::messages::MessageTemplates;
use super::reference::ReferenceStore;
use super::types::{CdsError, DoseStatus, DoseValidation, DoseValidationResult, RangeSummary};
use crate::models::enums::PediatricFormula;
use crate::models::{PatientProfile, PediatricRule, Prescription, TherapeuticRange};

/// Doses within this factor of the minimum are flagged below-range.
const LOW_BAND: f64 = 1.2;
/// Doses above this fraction of the maximum are flagged above-range.
const HIGH_BAND: f64 = 0.8;
/// Young's Rule applies below this age.
const YOUNGS_RULE_MAX_MONTHS: f64 = 24.0;

/// Validates prescribed doses against therapeutic ranges, adjusted for the
/// patient's age, renal and hepatic function.
pub struct DoseRangeValidator {
    store: Arc<dyn ReferenceStore>,
}

impl DoseRangeValidator {
    pub fn new(store: Arc<dyn ReferenceStore>) -> Self {
        Self { store }
    }

    pub fn validate_doses(
        &self,
        prescriptions: &[Prescription],
        patient: &PatientProfile,
    ) -> Result<DoseValidationResult, CdsError> {
        let start = Instant::now();
        let validations = prescriptions
            .iter()
            .map(|p| self.validate_one(p, patient))
            .collect::<Result<Vec<_>, _>>()?;

        let has_errors = validations.iter().any(|v| v.status.is_error());
        let has_warnings = validations.iter().any(|v| !v.warnings.is_empty());

        tracing::info!(
            prescriptions = prescriptions.len(),
            invalid = validations.iter().filter(|v| !v.is_valid).count(),
            has_errors,
            has_warnings,
            processing_ms = start.elapsed().as_millis() as u64,
            "Dose validation complete"
        );

        Ok(DoseValidationResult {
            validations,
            has_errors,
            has_warnings,
        })
    }

    fn validate_one(
        &self,
        prescription: &Prescription,
        patient: &PatientProfile,
    ) -> Result<DoseValidation, CdsError> {
        let name = &prescription.medication.name;
        let mut v = DoseValidation::new(name, &prescription.dose, &prescription.route);

        let Some(range) = self
            .store
            .find_therapeutic_range(name, &prescription.route)?
        else {
            v.warnings.push(MessageTemplates::no_range_data());
            return Ok(v);
        };

        v.therapeutic_range = Some(RangeSummary {
            min: range.min_dose,
            max: range.max_dose,
            unit: range.unit.clone(),
        });

        let parsed = match parse_dose(&prescription.dose) {
            Ok(d) => d,
            Err(_) => {
                tracing::debug!(medication = %name, dose = %prescription.dose, "Unparseable dose");
                v.status = DoseStatus::Toxic;
                v.is_valid = false;
                v.warnings.push(MessageTemplates::unparseable_dose(&prescription.dose));
                return Ok(v);
            }
        };

        let range_unit = DoseUnit::from_str(&range.unit).map_err(|_| {
            CdsError::UnsupportedConversion {
                from: parsed.unit.to_string(),
                to: range.unit.clone(),
            }
        })?;
        let converted = parsed.convert_to(range_unit)?.amount;
        v.converted_dose = Some(converted);

        let max = apply_adjustments(&mut v, &range, patient, converted);
        if let Some(summary) = v.therapeutic_range.as_mut() {
            summary.max = max;
        }

        v.status = classify(converted, range.min_dose, max);
        match v.status {
            DoseStatus::Toxic => v.warnings.push(MessageTemplates::dose_above_max(
                &format_amount(converted),
                &format_amount(max),
                &range.unit,
            )),
            DoseStatus::SubTherapeutic => v.warnings.push(MessageTemplates::dose_below_min(
                &format_amount(converted),
                &format_amount(range.min_dose),
                &range.unit,
            )),
            DoseStatus::AboveRange => v.warnings.push(MessageTemplates::dose_near_max(
                &format_amount(converted),
                &format_amount(max),
                &range.unit,
            )),
            DoseStatus::BelowRange => v.warnings.push(MessageTemplates::dose_near_min(
                &format_amount(converted),
                &format_amount(range.min_dose),
                &range.unit,
            )),
            DoseStatus::Ok => {}
        }

        check_daily_total(&mut v, &range, prescription, converted);

        if matches!(v.status, DoseStatus::Toxic | DoseStatus::SubTherapeutic) {
            v.recommendations.push(MessageTemplates::adjust_into_range(
                &format_amount(range.min_dose),
                &format_amount(max),
                &range.unit,
            ));
        }
        v.recommendations
            .extend(range.monitoring.iter().map(|m| MessageTemplates::monitor(m)));

        v.is_valid = v.status != DoseStatus::Toxic;
        Ok(v)
    }
}

/// Pediatric, geriatric, renal and hepatic adjustments. Pediatric and renal
/// scale `adjusted_dose` cumulatively; geriatric shrinks the maximum, which
/// is returned; hepatic only warns.
fn apply_adjustments(
    v: &mut DoseValidation,
    range: &TherapeuticRange,
    patient: &PatientProfile,
    converted: f64,
) -> f64 {
    let mut adjusted = converted;
    let mut max = range.max_dose;
    let mut touched = false;

    if let (true, Some(rule)) = (patient.is_pediatric(), range.pediatric.as_ref()) {
        if let Some((formula, dose)) = pediatric_dose(rule, patient, adjusted) {
            adjusted = dose;
            touched = true;
            v.pediatric_formula = Some(formula);
            v.adjustment_reasons.push(MessageTemplates::pediatric_adjustment(
                formula.as_str(),
                &format_amount(adjusted),
                &range.unit,
            ));
        }
    }

    if let (true, Some(rule)) = (patient.is_geriatric(), range.geriatric.as_ref()) {
        max *= 1.0 - rule.max_reduction_percent / 100.0;
        v.warnings.push(MessageTemplates::geriatric_reduction(
            rule.max_reduction_percent,
            &format_amount(max),
            &range.unit,
        ));
        if let Some(rec) = &rule.recommendation {
            v.recommendations.push(rec.clone());
        }
    }

    if let (Some(gfr), Some(rule)) = (patient.gfr, range.renal.as_ref()) {
        let (renal_dose, percent) =
            dose::renal_adjustment(adjusted, gfr, rule.gfr_threshold, rule.reduction_percent);
        touched = true;
        v.renal_adjustment_percent = Some(percent);
        if percent > 0.0 {
            adjusted = renal_dose;
            v.adjustment_reasons.push(MessageTemplates::renal_adjustment(
                gfr,
                rule.gfr_threshold,
                percent,
                &format_amount(adjusted),
                &range.unit,
            ));
        }
    }

    if let (true, Some(rule), Some(level)) = (
        patient.has_hepatic_impairment(),
        range.hepatic.as_ref(),
        patient.hepatic_function,
    ) {
        v.warnings
            .push(MessageTemplates::hepatic_impairment(level.as_str()));
        v.recommendations.push(rule.recommendation.clone());
    }

    if touched {
        v.adjusted_dose = Some(adjusted);
    }
    max
}

/// Formula selection: an explicit formula wins; otherwise Young's Rule under
/// 24 months and Clark's Rule from 24 months. Clark's needs a weight and
/// falls back to Young's without one.
fn pediatric_dose(
    rule: &PediatricRule,
    patient: &PatientProfile,
    dose: f64,
) -> Option<(PediatricFormula, f64)> {
    let age_months = patient.age_in_months()?;
    let age_years = age_months / 12.0;

    let preferred = rule.formula.unwrap_or(if age_months < YOUNGS_RULE_MAX_MONTHS {
        PediatricFormula::YoungsRule
    } else {
        PediatricFormula::ClarksRule
    });

    match (preferred, patient.weight_kg) {
        (PediatricFormula::ClarksRule, Some(weight)) => {
            Some((PediatricFormula::ClarksRule, dose::clarks_rule(dose, weight)))
        }
        _ => Some((PediatricFormula::YoungsRule, dose::youngs_rule(dose, age_years))),
    }
}

/// Place a dose against `[min, max]` with the near-boundary bands.
pub fn classify(dose: f64, min: f64, max: f64) -> DoseStatus {
    if dose < min {
        DoseStatus::SubTherapeutic
    } else if dose > max {
        DoseStatus::Toxic
    } else if dose < min * LOW_BAND {
        DoseStatus::BelowRange
    } else if dose > max * HIGH_BAND {
        DoseStatus::AboveRange
    } else {
        DoseStatus::Ok
    }
}

fn check_daily_total(
    v: &mut DoseValidation,
    range: &TherapeuticRange,
    prescription: &Prescription,
    converted: f64,
) {
    let Some(max_daily) = range.max_daily_dose else {
        return;
    };
    let Some(per_day) = prescription.frequency.as_deref().and_then(dose::doses_per_day) else {
        return;
    };

    let daily = converted * per_day;
    v.daily_dose = Some(daily);
    if daily > max_daily {
        v.status = DoseStatus::Toxic;
        v.warnings.push(MessageTemplates::daily_dose_exceeded(
            &format_amount(daily),
            &format_amount(max_daily),
            &range.unit,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::reference::test_support::FailingStore;
    use crate::clinical::reference::InMemoryReferenceStore;
    use crate::models::enums::HepaticFunction;
    use crate::models::RenalRule;

    fn validator() -> DoseRangeValidator {
        DoseRangeValidator::new(Arc::new(InMemoryReferenceStore::load_test()))
    }

    fn adult() -> PatientProfile {
        PatientProfile {
            age_years: Some(40.0),
            weight_kg: Some(70.0),
            ..Default::default()
        }
    }

    fn one(p: Prescription, patient: &PatientProfile) -> DoseValidation {
        let mut result = validator().validate_doses(&[p], patient).unwrap();
        result.validations.remove(0)
    }

    #[test]
    fn classification_bands() {
        assert_eq!(classify(0.5, 1.0, 10.0), DoseStatus::SubTherapeutic);
        assert_eq!(classify(1.0, 1.0, 10.0), DoseStatus::BelowRange);
        assert_eq!(classify(1.1, 1.0, 10.0), DoseStatus::BelowRange);
        assert_eq!(classify(1.2, 1.0, 10.0), DoseStatus::Ok);
        assert_eq!(classify(5.0, 1.0, 10.0), DoseStatus::Ok);
        assert_eq!(classify(8.0, 1.0, 10.0), DoseStatus::Ok);
        assert_eq!(classify(9.0, 1.0, 10.0), DoseStatus::AboveRange);
        assert_eq!(classify(10.0, 1.0, 10.0), DoseStatus::AboveRange);
        assert_eq!(classify(15.0, 1.0, 10.0), DoseStatus::Toxic);
    }

    #[test]
    fn warfarin_overdose_is_toxic() {
        let v = one(Prescription::new("warfarin", "15 mg"), &adult());
        assert_eq!(v.status, DoseStatus::Toxic);
        assert!(!v.is_valid);
        assert!(!v.recommendations.is_empty());
        assert!(v.warnings.iter().any(|w| w.contains("exceeds the maximum")));
    }

    #[test]
    fn warfarin_normal_dose_is_ok() {
        let v = one(Prescription::new("Warfarin", "5mg"), &adult());
        assert_eq!(v.status, DoseStatus::Ok);
        assert!(v.is_valid);
        assert_eq!(v.converted_dose, Some(5.0));
        // monitoring entries still recommended
        assert_eq!(v.recommendations, vec!["Monitor INR.", "Monitor signs of bleeding."]);
    }

    #[test]
    fn unknown_drug_is_valid_with_single_warning() {
        let v = one(Prescription::new("UnknownDrug", "100 mg"), &adult());
        assert!(v.is_valid);
        assert_eq!(v.status, DoseStatus::Ok);
        assert_eq!(
            v.warnings,
            vec!["No therapeutic range data available for validation".to_string()]
        );
    }

    #[test]
    fn unparseable_dose_is_invalid() {
        let v = one(Prescription::new("warfarin", "five milligrams"), &adult());
        assert_eq!(v.status, DoseStatus::Toxic);
        assert!(!v.is_valid);
        assert_eq!(v.warnings.len(), 1);
        assert!(v.warnings[0].contains("could not be safety-checked"));
    }

    #[test]
    fn grams_convert_to_range_unit() {
        let v = one(Prescription::new("amoxicillin", "0.5 g"), &adult());
        assert_eq!(v.converted_dose, Some(500.0));
        assert_eq!(v.status, DoseStatus::Ok);
    }

    #[test]
    fn cross_dimension_dose_is_hard_error() {
        let err = validator()
            .validate_doses(&[Prescription::new("warfarin", "5 ml")], &adult())
            .unwrap_err();
        assert!(matches!(err, CdsError::UnsupportedConversion { .. }));
    }

    #[test]
    fn route_selects_range() {
        let v = one(
            Prescription::new("warfarin", "5 mg").with_route("intravenous"),
            &adult(),
        );
        assert_eq!(v.warnings, vec![MessageTemplates::no_range_data()]);
    }

    #[test]
    fn geriatric_shrinks_max() {
        let elder = PatientProfile {
            age_years: Some(80.0),
            ..Default::default()
        };
        // 9 mg: above-range for adults, toxic against the 8 mg geriatric max
        let v = one(Prescription::new("warfarin", "9 mg"), &elder);
        assert_eq!(v.therapeutic_range.as_ref().unwrap().max, 8.0);
        assert_eq!(v.status, DoseStatus::Toxic);
        assert!(v
            .recommendations
            .contains(&"Start at a lower dose and titrate to INR.".to_string()));

        let v = one(Prescription::new("warfarin", "9 mg"), &adult());
        assert_eq!(v.status, DoseStatus::AboveRange);
    }

    #[test]
    fn pediatric_clarks_rule() {
        let child = PatientProfile {
            age_months: Some(60.0),
            weight_kg: Some(20.0),
            ..Default::default()
        };
        let v = one(Prescription::new("acetaminophen", "100 mg"), &child);
        assert_eq!(v.pediatric_formula, Some(PediatricFormula::ClarksRule));
        let adjusted = v.adjusted_dose.unwrap();
        assert!((adjusted - 28.57).abs() < 0.01);
        assert_eq!(v.adjustment_reasons.len(), 1);
    }

    #[test]
    fn pediatric_infant_uses_youngs_rule() {
        let infant = PatientProfile {
            age_months: Some(18.0),
            weight_kg: Some(11.0),
            ..Default::default()
        };
        let v = one(Prescription::new("amoxicillin", "500 mg"), &infant);
        assert_eq!(v.pediatric_formula, Some(PediatricFormula::YoungsRule));
        let expected = 1.5 / 13.5 * 500.0;
        assert!((v.adjusted_dose.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn pediatric_without_weight_falls_back_to_youngs() {
        let child = PatientProfile {
            age_years: Some(6.0),
            ..Default::default()
        };
        let v = one(Prescription::new("amoxicillin", "500 mg"), &child);
        assert_eq!(v.pediatric_formula, Some(PediatricFormula::YoungsRule));
    }

    #[test]
    fn pediatric_rule_absent_means_no_adjustment() {
        let child = PatientProfile {
            age_years: Some(6.0),
            weight_kg: Some(20.0),
            ..Default::default()
        };
        let v = one(Prescription::new("warfarin", "2 mg"), &child);
        assert_eq!(v.pediatric_formula, None);
        assert_eq!(v.adjusted_dose, None);
    }

    #[test]
    fn renal_adjustment_below_threshold() {
        let store = InMemoryReferenceStore::from_bundle(crate::clinical::ReferenceBundle {
            therapeutic_ranges: vec![TherapeuticRange {
                medication: "renaldrug".into(),
                route: "oral".into(),
                min_dose: 100.0,
                max_dose: 2000.0,
                unit: "mg".into(),
                max_daily_dose: None,
                pediatric: None,
                geriatric: None,
                renal: Some(RenalRule {
                    gfr_threshold: 30.0,
                    reduction_percent: 50.0,
                }),
                hepatic: None,
                monitoring: vec![],
            }],
            ..Default::default()
        });
        let validator = DoseRangeValidator::new(Arc::new(store));
        let p = [Prescription::new("renaldrug", "1000 mg")];

        let impaired = PatientProfile {
            gfr: Some(25.0),
            ..Default::default()
        };
        let v = &validator.validate_doses(&p, &impaired).unwrap().validations[0];
        assert_eq!(v.adjusted_dose, Some(500.0));
        assert_eq!(v.renal_adjustment_percent, Some(50.0));

        let normal = PatientProfile {
            gfr: Some(60.0),
            ..Default::default()
        };
        let v = &validator.validate_doses(&p, &normal).unwrap().validations[0];
        assert_eq!(v.adjusted_dose, Some(1000.0));
        assert_eq!(v.renal_adjustment_percent, Some(0.0));
        assert!(v.adjustment_reasons.is_empty());
    }

    #[test]
    fn hepatic_impairment_warns_only() {
        let patient = PatientProfile {
            age_years: Some(50.0),
            hepatic_function: Some(HepaticFunction::Moderate),
            ..Default::default()
        };
        let v = one(Prescription::new("warfarin", "5 mg"), &patient);
        assert_eq!(v.status, DoseStatus::Ok);
        assert!(v.warnings.iter().any(|w| w.contains("moderate hepatic impairment")));
        assert!(v
            .recommendations
            .contains(&"Reduce the dose and monitor INR closely.".to_string()));
        assert_eq!(v.adjusted_dose, None);
    }

    #[test]
    fn daily_total_over_max_is_toxic() {
        let v = one(
            Prescription::new("acetaminophen", "1000 mg").with_frequency("q4h"),
            &adult(),
        );
        assert_eq!(v.daily_dose, Some(6000.0));
        assert_eq!(v.status, DoseStatus::Toxic);
        assert!(!v.is_valid);

        let v = one(
            Prescription::new("acetaminophen", "650 mg").with_frequency("QID"),
            &adult(),
        );
        assert_eq!(v.daily_dose, Some(2600.0));
        assert_eq!(v.status, DoseStatus::Ok);
    }

    #[test]
    fn as_needed_frequency_skips_daily_total() {
        let v = one(
            Prescription::new("acetaminophen", "1000 mg").with_frequency("PRN"),
            &adult(),
        );
        assert_eq!(v.daily_dose, None);
    }

    #[test]
    fn aggregate_flags() {
        let result = validator()
            .validate_doses(
                &[
                    Prescription::new("warfarin", "5 mg"),
                    Prescription::new("lactulose", "25 ml"),
                ],
                &adult(),
            )
            .unwrap();
        // lactulose 25 ml > 0.8 × 30 ml
        assert_eq!(result.validations[1].status, DoseStatus::AboveRange);
        assert!(result.has_errors);
        assert!(result.has_warnings);

        let clean = validator()
            .validate_doses(&[Prescription::new("warfarin", "5 mg")], &adult())
            .unwrap();
        assert!(!clean.has_errors);
        assert!(!clean.has_warnings);
    }

    #[test]
    fn below_range_is_warning_not_error() {
        let result = validator()
            .validate_doses(&[Prescription::new("insulin regular", "2 units").with_route("subcutaneous")], &adult())
            .unwrap();
        assert_eq!(result.validations[0].status, DoseStatus::BelowRange);
        assert!(!result.has_errors);
        assert!(result.has_warnings);
    }

    #[test]
    fn sub_therapeutic_recommends_range() {
        let v = one(Prescription::new("metformin", "100 mg"), &adult());
        assert_eq!(v.status, DoseStatus::SubTherapeutic);
        assert!(v.is_valid);
        assert_eq!(v.recommendations[0], "Adjust the dose to within 500-1000 mg.");
    }

    #[test]
    fn lookup_failure_fails_the_check() {
        let err = DoseRangeValidator::new(Arc::new(FailingStore))
            .validate_doses(&[Prescription::new("warfarin", "5 mg")], &adult())
            .unwrap_err();
        assert!(matches!(err, CdsError::Lookup(_)));
    }
}

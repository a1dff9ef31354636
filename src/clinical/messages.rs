/// Text for alert messages and recommendations, kept in one place so every
/// checker words the same situation the same way.
pub struct MessageTemplates;

impl MessageTemplates {
    pub fn allergy_direct(medication: &str, allergen: &str) -> String {
        format!("Patient has a documented allergy to {allergen}; {medication} is the same substance.")
    }

    pub fn allergy_cross_reactive(
        medication: &str,
        drug_class: &str,
        allergen: &str,
        allergen_class: &str,
        risk_percent: Option<f64>,
    ) -> String {
        let risk = risk_percent
            .map(|p| format!(" (approximately {p}% cross-reactivity)"))
            .unwrap_or_default();
        format!(
            "{medication} ({drug_class}) may cross-react with the documented {allergen} \
             allergy ({allergen_class}){risk}."
        )
    }

    pub fn allergy_same_class(medication: &str, drug_class: &str, allergen: &str) -> String {
        format!(
            "{medication} belongs to the {drug_class} class, the same class as the documented \
             {allergen} allergy."
        )
    }

    pub fn do_not_administer(medication: &str) -> String {
        format!("Do not administer {medication}.")
    }

    pub fn use_with_allergy_caution(medication: &str) -> String {
        format!(
            "Use {medication} with caution; confirm the allergy history and monitor for a \
             hypersensitivity reaction, or choose an unrelated alternative."
        )
    }

    pub fn contraindicated_with_alternatives(medication: &str, alternatives: &[String]) -> String {
        format!(
            "Do not use {medication}. Consider alternatives: {}.",
            alternatives.join(", ")
        )
    }

    pub fn contraindicated(medication: &str, rationale: &str) -> String {
        format!("Do not use {medication}. {rationale}")
    }

    pub fn use_with_caution(medication: &str, rationale: &str) -> String {
        format!(
            "Use {medication} with caution. {rationale} Monitor the patient closely and \
             reassess the risk-benefit balance."
        )
    }

    pub fn no_range_data() -> String {
        "No therapeutic range data available for validation".to_string()
    }

    pub fn unparseable_dose(dose: &str) -> String {
        format!("Dose '{dose}' could not be parsed, so it could not be safety-checked.")
    }

    pub fn pediatric_adjustment(formula: &str, adjusted: &str, unit: &str) -> String {
        format!("Pediatric dose by {formula}: {adjusted} {unit}")
    }

    pub fn geriatric_reduction(percent: f64, max: &str, unit: &str) -> String {
        format!(
            "Patient is 65 or older: maximum dose reduced by {percent}% to {max} {unit}."
        )
    }

    pub fn renal_adjustment(gfr: f64, threshold: f64, percent: f64, adjusted: &str, unit: &str) -> String {
        format!(
            "GFR {gfr} is below {threshold}: dose reduced by {percent}% to {adjusted} {unit}."
        )
    }

    pub fn hepatic_impairment(level: &str) -> String {
        format!("Patient has {level} hepatic impairment.")
    }

    pub fn daily_dose_exceeded(daily: &str, max_daily: &str, unit: &str) -> String {
        format!(
            "Daily total of {daily} {unit} exceeds the maximum daily dose of {max_daily} {unit}."
        )
    }

    pub fn dose_above_max(dose: &str, max: &str, unit: &str) -> String {
        format!("Dose of {dose} {unit} exceeds the maximum of {max} {unit}.")
    }

    pub fn dose_below_min(dose: &str, min: &str, unit: &str) -> String {
        format!("Dose of {dose} {unit} is below the minimum therapeutic dose of {min} {unit}.")
    }

    pub fn dose_near_max(dose: &str, max: &str, unit: &str) -> String {
        format!("Dose of {dose} {unit} is close to the maximum of {max} {unit}.")
    }

    pub fn dose_near_min(dose: &str, min: &str, unit: &str) -> String {
        format!("Dose of {dose} {unit} is close to the minimum of {min} {unit}.")
    }

    pub fn adjust_into_range(min: &str, max: &str, unit: &str) -> String {
        format!("Adjust the dose to within {min}-{max} {unit}.")
    }

    pub fn monitor(parameter: &str) -> String {
        format!("Monitor {parameter}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternatives_are_listed() {
        let msg = MessageTemplates::contraindicated_with_alternatives(
            "metformin",
            &["insulin".to_string(), "linagliptin".to_string()],
        );
        assert_eq!(
            msg,
            "Do not use metformin. Consider alternatives: insulin, linagliptin."
        );
    }

    #[test]
    fn cross_reactivity_mentions_risk_when_known() {
        let with = MessageTemplates::allergy_cross_reactive(
            "cephalexin",
            "cephalosporin",
            "penicillin",
            "penicillin",
            Some(10.0),
        );
        assert!(with.contains("10% cross-reactivity"));
        let without =
            MessageTemplates::allergy_cross_reactive("x", "a", "y", "b", None);
        assert!(!without.contains('%'));
    }

    #[test]
    fn caution_text_starts_with_use() {
        let msg = MessageTemplates::use_with_caution("ibuprofen", "Worsens heart failure.");
        assert!(msg.starts_with("Use ibuprofen with caution. Worsens heart failure."));
    }
}

use serde::{Deserialize, Serialize};

use super::enums::HepaticFunction;

/// Patient attributes the dose validator adjusts for. Every field is optional;
/// an absent attribute simply disables the adjustments that depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    #[serde(default)]
    pub age_years: Option<f64>,
    /// More precise than `age_years` for infants; takes precedence when set.
    #[serde(default)]
    pub age_months: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Glomerular filtration rate, mL/min/1.73m².
    #[serde(default, alias = "renalFunction")]
    pub gfr: Option<f64>,
    #[serde(default)]
    pub hepatic_function: Option<HepaticFunction>,
}

impl PatientProfile {
    pub fn age_in_months(&self) -> Option<f64> {
        self.age_months.or(self.age_years.map(|y| y * 12.0))
    }

    pub fn age_in_years(&self) -> Option<f64> {
        self.age_months.map(|m| m / 12.0).or(self.age_years)
    }

    pub fn is_pediatric(&self) -> bool {
        self.age_in_years().is_some_and(|age| age < 18.0)
    }

    pub fn is_geriatric(&self) -> bool {
        self.age_in_years().is_some_and(|age| age >= 65.0)
    }

    pub fn has_hepatic_impairment(&self) -> bool {
        self.hepatic_function
            .is_some_and(|h| h != HepaticFunction::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_take_precedence_over_years() {
        let p = PatientProfile {
            age_years: Some(10.0),
            age_months: Some(18.0),
            ..Default::default()
        };
        assert_eq!(p.age_in_months(), Some(18.0));
        assert_eq!(p.age_in_years(), Some(1.5));
        assert!(p.is_pediatric());
    }

    #[test]
    fn age_brackets() {
        let adult = PatientProfile {
            age_years: Some(40.0),
            ..Default::default()
        };
        assert!(!adult.is_pediatric());
        assert!(!adult.is_geriatric());

        let elder = PatientProfile {
            age_years: Some(65.0),
            ..Default::default()
        };
        assert!(elder.is_geriatric());

        assert!(!PatientProfile::default().is_pediatric());
    }

    #[test]
    fn normal_liver_is_not_impaired() {
        let mut p = PatientProfile {
            hepatic_function: Some(HepaticFunction::Normal),
            ..Default::default()
        };
        assert!(!p.has_hepatic_impairment());
        p.hepatic_function = Some(HepaticFunction::Moderate);
        assert!(p.has_hepatic_impairment());
    }

    #[test]
    fn renal_function_alias_accepted() {
        let p: PatientProfile = serde_json::from_str(r#"{"renalFunction": 25}"#).unwrap();
        assert_eq!(p.gfr, Some(25.0));
    }
}

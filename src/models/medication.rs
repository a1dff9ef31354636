use serde::{Deserialize, Serialize};

use super::enums::ClassSource;

/// Route assumed when a prescription does not name one.
pub const DEFAULT_ROUTE: &str = "oral";

/// A medication as named by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_norm_code: Option<String>,
}

impl MedicationRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rx_norm_code: None,
        }
    }

    pub fn with_code(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rx_norm_code: Some(code.into()),
        }
    }

    /// Lowercased, trimmed name used for every reference lookup.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// A prescribed medication with its dose as written on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(flatten)]
    pub medication: MedicationRef,
    pub dose: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default = "default_route")]
    pub route: String,
}

impl Prescription {
    pub fn new(name: impl Into<String>, dose: impl Into<String>) -> Self {
        Self {
            medication: MedicationRef::new(name),
            dose: dose.into(),
            frequency: None,
            route: default_route(),
        }
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }
}

fn default_route() -> String {
    DEFAULT_ROUTE.to_string()
}

/// Pharmacological class resolved for a medication or allergen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugClass {
    pub name: String,
    pub source: ClassSource,
}

impl DrugClass {
    pub fn new(name: impl Into<String>, source: ClassSource) -> Self {
        Self {
            name: normalize_name(&name.into()),
            source,
        }
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescription_defaults_route_to_oral() {
        let rx: Prescription =
            serde_json::from_str(r#"{"name":"Warfarin","dose":"5mg"}"#).unwrap();
        assert_eq!(rx.route, "oral");
        assert_eq!(rx.medication.name, "Warfarin");
        assert!(rx.frequency.is_none());
    }

    #[test]
    fn medication_ref_reads_camel_case_code() {
        let med: MedicationRef =
            serde_json::from_str(r#"{"name":"Warfarin","rxNormCode":"11289"}"#).unwrap();
        assert_eq!(med.rx_norm_code.as_deref(), Some("11289"));
    }

    #[test]
    fn normalized_name_trims_and_lowercases() {
        assert_eq!(MedicationRef::new("  Amoxicillin ").normalized_name(), "amoxicillin");
    }
}

/// Known cross-reactivity between two drug classes. Symmetric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossReactivity {
    pub class_a: &'static str,
    pub class_b: &'static str,
    /// Approximate reaction risk, when the literature gives one.
    pub risk_percent: Option<f64>,
}

const TABLE: &[CrossReactivity] = &[
    CrossReactivity {
        class_a: "penicillin",
        class_b: "cephalosporin",
        risk_percent: Some(10.0),
    },
    CrossReactivity {
        class_a: "penicillin",
        class_b: "carbapenem",
        risk_percent: Some(1.0),
    },
    CrossReactivity {
        class_a: "cephalosporin",
        class_b: "carbapenem",
        risk_percent: Some(1.0),
    },
    CrossReactivity {
        class_a: "cephalosporin",
        class_b: "monobactam",
        risk_percent: None,
    },
    CrossReactivity {
        class_a: "sulfonamide",
        class_b: "sulfonylurea",
        risk_percent: None,
    },
    CrossReactivity {
        class_a: "nsaid",
        class_b: "salicylate",
        risk_percent: None,
    },
];

/// Table entry relating two classes, in either order. Case-insensitive.
pub fn lookup(a: &str, b: &str) -> Option<&'static CrossReactivity> {
    let (a, b) = (a.trim().to_lowercase(), b.trim().to_lowercase());
    TABLE
        .iter()
        .find(|e| (e.class_a == a && e.class_b == b) || (e.class_a == b && e.class_b == a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric() {
        let ab = lookup("penicillin", "cephalosporin").unwrap();
        let ba = lookup("Cephalosporin", "PENICILLIN").unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.risk_percent, Some(10.0));
    }

    #[test]
    fn unrelated_classes() {
        assert!(lookup("penicillin", "statin").is_none());
        assert!(lookup("penicillin", "penicillin").is_none());
    }
}

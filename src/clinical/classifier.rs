use std::sync::Arc;

use super::reference::ReferenceStore;
use super::types::LookupError;
use crate::models::enums::ClassSource;
use crate::models::{normalize_name, DrugClass};

/// Resolves the pharmacological class of a medication or allergen name.
/// `Ok(None)` means the class is unknown.
pub trait DrugClassifier: Send + Sync {
    fn classify(&self, name: &str) -> Result<Option<DrugClass>, LookupError>;
}

/// Classes recorded in the reference store.
pub struct LookupTableClassifier {
    store: Arc<dyn ReferenceStore>,
}

impl LookupTableClassifier {
    pub fn new(store: Arc<dyn ReferenceStore>) -> Self {
        Self { store }
    }
}

impl DrugClassifier for LookupTableClassifier {
    fn classify(&self, name: &str) -> Result<Option<DrugClass>, LookupError> {
        Ok(self
            .store
            .drug_class(name)?
            .map(|class| DrugClass::new(class, ClassSource::LookupTable)))
    }
}

enum Pattern {
    Prefix(&'static str),
    Suffix(&'static str),
}

impl Pattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(p) => name.starts_with(p),
            Self::Suffix(s) => name.ends_with(s),
        }
    }
}

/// Ordered naming-stem rules. First match wins.
const STEM_RULES: &[(Pattern, &str)] = &[
    (Pattern::Suffix("cillin"), "penicillin"),
    (Pattern::Prefix("cef"), "cephalosporin"),
    (Pattern::Prefix("ceph"), "cephalosporin"),
    (Pattern::Suffix("penem"), "carbapenem"),
    (Pattern::Suffix("thromycin"), "macrolide"),
    (Pattern::Suffix("floxacin"), "fluoroquinolone"),
    (Pattern::Suffix("cycline"), "tetracycline"),
    (Pattern::Prefix("sulfa"), "sulfonamide"),
    (Pattern::Suffix("statin"), "statin"),
    (Pattern::Suffix("pril"), "ace-inhibitor"),
    (Pattern::Suffix("sartan"), "arb"),
    (Pattern::Suffix("olol"), "beta-blocker"),
    (Pattern::Suffix("dipine"), "calcium-channel-blocker"),
    (Pattern::Suffix("prazole"), "proton-pump-inhibitor"),
    (Pattern::Suffix("gliptin"), "dpp4-inhibitor"),
    (Pattern::Suffix("parin"), "anticoagulant"),
    (Pattern::Suffix("profen"), "nsaid"),
    (Pattern::Suffix("triptan"), "triptan"),
    (Pattern::Suffix("azepam"), "benzodiazepine"),
    (Pattern::Suffix("azolam"), "benzodiazepine"),
    (Pattern::Suffix("oxetine"), "ssri"),
];

/// Guesses a class from the drug-name stem.
///
/// This is a naming heuristic, not a taxonomy: it misfiles drugs whose names
/// happen to share a stem (nystatin is an antifungal, duloxetine an SNRI).
/// Keep it behind a lookup table in any clinical deployment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuffixHeuristicClassifier;

impl DrugClassifier for SuffixHeuristicClassifier {
    fn classify(&self, name: &str) -> Result<Option<DrugClass>, LookupError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Ok(None);
        }
        Ok(STEM_RULES
            .iter()
            .find(|(pattern, _)| pattern.matches(&name))
            .map(|(_, class)| DrugClass::new(*class, ClassSource::Heuristic)))
    }
}

/// Tries each classifier in order; the first known class wins. A lookup
/// error from any link stops the chain.
pub struct ChainedClassifier {
    links: Vec<Arc<dyn DrugClassifier>>,
}

impl ChainedClassifier {
    pub fn new(links: Vec<Arc<dyn DrugClassifier>>) -> Self {
        Self { links }
    }

    /// Lookup table first, stem heuristic as fallback.
    pub fn table_then_heuristic(store: Arc<dyn ReferenceStore>) -> Self {
        Self::new(vec![
            Arc::new(LookupTableClassifier::new(store)),
            Arc::new(SuffixHeuristicClassifier),
        ])
    }
}

impl DrugClassifier for ChainedClassifier {
    fn classify(&self, name: &str) -> Result<Option<DrugClass>, LookupError> {
        for link in &self.links {
            if let Some(class) = link.classify(name)? {
                return Ok(Some(class));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::reference::test_support::FailingStore;
    use crate::clinical::reference::InMemoryReferenceStore;

    fn heuristic(name: &str) -> Option<String> {
        SuffixHeuristicClassifier
            .classify(name)
            .unwrap()
            .map(|c| c.name)
    }

    #[test]
    fn heuristic_stems() {
        assert_eq!(heuristic("Amoxicillin").as_deref(), Some("penicillin"));
        assert_eq!(heuristic("cephalexin").as_deref(), Some("cephalosporin"));
        assert_eq!(heuristic("ceftriaxone").as_deref(), Some("cephalosporin"));
        assert_eq!(heuristic("meropenem").as_deref(), Some("carbapenem"));
        assert_eq!(heuristic("atorvastatin").as_deref(), Some("statin"));
        assert_eq!(heuristic("omeprazole").as_deref(), Some("proton-pump-inhibitor"));
        assert_eq!(heuristic("lorazepam").as_deref(), Some("benzodiazepine"));
    }

    #[test]
    fn heuristic_unknown_is_none() {
        assert_eq!(heuristic("unknowndrug"), None);
        assert_eq!(heuristic("   "), None);
    }

    #[test]
    fn heuristic_marks_source() {
        let class = SuffixHeuristicClassifier.classify("naproxen").unwrap();
        assert!(class.is_none());
        let class = SuffixHeuristicClassifier.classify("ibuprofen").unwrap().unwrap();
        assert_eq!(class.source, ClassSource::Heuristic);
    }

    #[test]
    fn table_wins_over_heuristic() {
        let store: Arc<dyn ReferenceStore> = Arc::new(InMemoryReferenceStore::load_test());
        let chain = ChainedClassifier::table_then_heuristic(store);

        let table = chain.classify("aspirin").unwrap().unwrap();
        assert_eq!(table.name, "nsaid");
        assert_eq!(table.source, ClassSource::LookupTable);

        let fallback = chain.classify("piperacillin").unwrap().unwrap();
        assert_eq!(fallback.name, "penicillin");
        assert_eq!(fallback.source, ClassSource::Heuristic);

        assert!(chain.classify("unknowndrug").unwrap().is_none());
    }

    #[test]
    fn chain_propagates_lookup_errors() {
        let chain = ChainedClassifier::table_then_heuristic(Arc::new(FailingStore));
        assert!(chain.classify("amoxicillin").is_err());
    }
}

//! Clinical decision support checks.
//!
//! Four independent, side-effect-free checkers over injected reference data:
//! - `InteractionMatcher`: pairwise drug-drug interactions
//! - `AllergyChecker`: direct, cross-reactive and same-class allergy alerts
//! - `ContraindicationScreener`: drug-condition contraindications
//! - `DoseRangeValidator`: therapeutic range with patient adjustments
//!
//! `CdsService` wraps them for async callers.

pub mod allergies;
pub mod classifier;
pub mod contraindications;
pub mod cross_reactivity;
pub mod dose;
pub mod dosing;
pub mod interactions;
pub mod messages;
pub mod reference;
pub mod service;
pub mod types;

pub use allergies::AllergyChecker;
pub use classifier::{
    ChainedClassifier, DrugClassifier, LookupTableClassifier, SuffixHeuristicClassifier,
};
pub use contraindications::ContraindicationScreener;
pub use dosing::DoseRangeValidator;
pub use interactions::InteractionMatcher;
pub use reference::{InMemoryReferenceStore, ReferenceBundle, ReferenceStore};
pub use service::{CdsService, FullCheckInput};
pub use types::*;

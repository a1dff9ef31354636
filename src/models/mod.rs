pub mod allergy;
pub mod contraindication;
pub mod enums;
pub mod interaction;
pub mod medication;
pub mod patient;
pub mod therapeutic_range;

pub use allergy::*;
pub use contraindication::*;
pub use interaction::*;
pub use medication::*;
pub use patient::*;
pub use therapeutic_range::*;

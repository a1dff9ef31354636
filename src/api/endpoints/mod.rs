//! API endpoint handlers.

pub mod checks;
pub mod convert;
pub mod health;

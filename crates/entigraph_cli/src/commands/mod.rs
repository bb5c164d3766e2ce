//! CLI command implementations.

pub mod edit;
pub mod inspect;

//! Utils Module - Helper functions and shared utilities
//!
//! constants.rs is the single source of truth for defaults.

pub mod cache;
pub mod constants;
pub mod validation;

pub use cache::*;
pub use constants::*;
pub use validation::*;

//! Models Module - Data Structures & Configuration
//!
//! Network profiles, findings, score results and the error taxonomy.

pub mod config;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;

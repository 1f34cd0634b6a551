//! Core Module - Connection management and risk scoring
//!
//! Verified RPC handles, local checks, AI analysis and the scoring pipeline.

pub mod ai_analysis;
pub mod connection;
pub mod heuristics;
pub mod rate_limiter;
pub mod report;
pub mod risk_score;
pub mod scanner;
pub mod static_checks;

pub use ai_analysis::{AiAnalyzer, AiAssessment};
pub use connection::{ConnectionHandle, ConnectionManager};
pub use heuristics::{InteractionHeuristic, NoSignalHeuristic};
pub use rate_limiter::RateLimiter;
pub use report::{format_finding, ScanReport};
pub use risk_score::*;
pub use scanner::ScoringPipeline;
pub use static_checks::{run_local_checks, LocalAnalysis};

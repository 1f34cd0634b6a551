//! Chain Sentinel HTTP API
//! REST endpoints for contract and wallet risk scans

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;

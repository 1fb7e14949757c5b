//! HTTP JSON server for the VeriLeaf registry.
//!
//! Provides endpoints for:
//! - Claim and score lookups
//! - Signed, single-use write calls (register claim, submit score, rotate
//!   verifier)
//! - The paginated audit log
//! - Prometheus metrics

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod replay;
pub mod server;

pub use auth::{calls, SignedCall};
pub use error::RpcError;
pub use metrics::RegistryMetrics;
pub use replay::ReplayGuard;
pub use server::{AppState, RpcConfig, RpcServer};

//! VeriLeaf registry node.
//!
//! The node is the process-level coordinator that:
//! - Opens the LMDB store, whose audit trail persists across restarts, and
//!   constructs or reopens the registry
//! - Fans registry notifications out to metrics, WebSocket clients and the
//!   log output
//! - Serves the RPC and WebSocket endpoints
//! - Shuts everything down cleanly on SIGINT/SIGTERM

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::{NodeRegistry, RegistryNode};
pub use shutdown::ShutdownController;

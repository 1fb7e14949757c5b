//! LMDB storage backend for the VeriLeaf registry.
//!
//! Implements the storage traits from `verileaf-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database within a single
//! environment; every `put_*` is one write transaction covering the state
//! change and its audit trail entry.

pub mod claim;
pub mod environment;
pub mod error;
pub mod event;
pub mod meta;
pub mod migration;
pub mod role;
pub mod score;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;

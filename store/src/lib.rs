//! Abstract storage traits for the VeriLeaf registry.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The registry depends only on the traits.
//!
//! Each `put_*` call must be atomic on its own, covering both the state change
//! and its audit trail entry: the registry performs at most one of them per
//! write operation and relies on that for all-or-nothing semantics.

pub mod claim;
pub mod error;
pub mod event;
pub mod role;
pub mod score;

pub use claim::ClaimStore;
pub use error::StoreError;
pub use event::EventStore;
pub use role::{RoleStore, Roles};
pub use score::ScoreStore;

/// Everything the registry needs from a backend.
pub trait RegistryStore: ClaimStore + ScoreStore + RoleStore + EventStore {}

impl<T: ClaimStore + ScoreStore + RoleStore + EventStore> RegistryStore for T {}

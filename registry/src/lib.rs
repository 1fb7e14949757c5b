//! Claim-and-score registry.
//!
//! An identity registers (and freely overwrites) its own geographic claim.
//! A single verifier writes impact scores for any identity. A permanent owner
//! may rotate the verifier. Every successful write records one audit trail
//! entry in the store, atomically with the state change, and then notifies
//! an injected [`EventLog`].
//!
//! The registry holds no ambient state: it owns a storage backend and an
//! event log handed to it at construction, and every write takes the caller
//! as an explicit [`CallContext`].

pub mod assessment;
pub mod context;
pub mod error;
pub mod log;
pub mod registry;

pub use assessment::{ImpactAssessment, ImpactCategory, VegetationMetrics};
pub use context::CallContext;
pub use error::{RegistryError, Role};
pub use log::{EventBus, EventLog, LoggedEvent, MemoryEventLog};
pub use registry::Registry;

//! Fundamental types for the VeriLeaf registry.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! identities, keys, timestamps, claims, impact scores and registry events.

pub mod claim;
pub mod error;
pub mod event;
pub mod identity;
pub mod keys;
pub mod score;
pub mod time;

pub use claim::Claim;
pub use error::{IdentityError, ScoreOutOfRange};
pub use event::RegistryEvent;
pub use identity::Identity;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use score::ImpactScore;
pub use time::{Clock, SystemClock, Timestamp};

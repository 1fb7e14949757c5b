//! Cryptographic primitives for the VeriLeaf registry.
//!
//! - **Ed25519** for signing registry calls; the signer's public key is the
//!   caller's identity
//! - **Blake2b** for the call digest that gets signed

pub mod call;
pub mod hash;
pub mod keys;
pub mod sign;

pub use call::{call_digest, sign_call, verify_call, CALL_DOMAIN};
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};

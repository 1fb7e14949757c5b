//! Key material for signing registry calls.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

/// A 32-byte Ed25519 secret seed.
///
/// Deliberately neither `Debug`, `Clone` nor `Serialize`. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

/// A 64-byte Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

/// An Ed25519 key pair.
///
/// Build one with `verileaf_crypto::generate_keypair()` or
/// `verileaf_crypto::keypair_from_seed()`.
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl KeyPair {
    /// The registry identity this key pair signs for.
    pub fn identity(&self) -> crate::Identity {
        crate::Identity::from_public_key(&self.public)
    }
}

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Build a signature from a slice, `None` unless it is exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 64] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

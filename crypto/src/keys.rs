//! Ed25519 key generation.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use verileaf_types::{KeyPair, PrivateKey, PublicKey};

/// Generate a new Ed25519 key pair from a secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Derive a key pair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    let private = PrivateKey(*seed);
    KeyPair {
        public: public_from_private(&private),
        private,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_nonzero_keys() {
        let a = generate_keypair();
        let b = generate_keypair();
        assert_ne!(a.public.0, [0u8; 32]);
        assert_ne!(a.public, b.public);
    }

    #[test]
    fn keypair_from_seed_deterministic() {
        let kp1 = keypair_from_seed(&[42u8; 32]);
        let kp2 = keypair_from_seed(&[42u8; 32]);
        assert_eq!(kp1.public, kp2.public);
        assert_eq!(kp1.identity(), kp2.identity());
    }

    #[test]
    fn seed_identity_is_never_null() {
        let kp = keypair_from_seed(&[0u8; 32]);
        assert!(!kp.identity().is_null());
    }
}

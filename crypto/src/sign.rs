//! Ed25519 message signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use verileaf_types::{PrivateKey, PublicKey, Signature};

/// Sign a message with a private key.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Rejects invalid keys (including the all-zero key) and malformed
/// signatures by returning `false`.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

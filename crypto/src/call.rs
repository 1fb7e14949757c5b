//! Signing and verification of registry calls.
//!
//! The signed digest binds the call name, the issue time and the exact
//! payload bytes, so a signature cannot be moved to a different call,
//! endpoint or time:
//!
//! `Blake2b-256(CALL_DOMAIN || call || 0x00 || issued_at_le64 || payload)`
//!
//! A valid signature does not by itself stop the identical call being
//! submitted twice. Callers that apply calls must also remember which
//! digests they have accepted; the RPC server does this for as long as a
//! call can pass its freshness check.

use verileaf_types::{Identity, PrivateKey, Signature, Timestamp};

use crate::hash::blake2b_256_multi;
use crate::sign::{sign_message, verify_signature};

/// Domain separation tag for registry call signatures.
pub const CALL_DOMAIN: &[u8] = b"verileaf-call-v1";

/// Digest that a caller signs for a registry call.
pub fn call_digest(call: &str, issued_at: Timestamp, payload: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[
        CALL_DOMAIN,
        call.as_bytes(),
        &[0u8],
        &issued_at.as_secs().to_le_bytes(),
        payload,
    ])
}

/// Sign a registry call.
pub fn sign_call(
    private_key: &PrivateKey,
    call: &str,
    issued_at: Timestamp,
    payload: &[u8],
) -> Signature {
    sign_message(&call_digest(call, issued_at, payload), private_key)
}

/// Check that `signer` produced `signature` for this call.
pub fn verify_call(
    signer: &Identity,
    call: &str,
    issued_at: Timestamp,
    payload: &[u8],
    signature: &Signature,
) -> bool {
    verify_signature(
        &call_digest(call, issued_at, payload),
        signature,
        &signer.public_key(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    const PAYLOAD: &[u8] = br#"{"identity":"x","score":87}"#;

    #[test]
    fn signed_call_verifies_for_signer() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let at = Timestamp::new(1_700_000_000);
        let sig = sign_call(&kp.private, "submit_impact_score", at, PAYLOAD);
        assert!(verify_call(&kp.identity(), "submit_impact_score", at, PAYLOAD, &sig));
    }

    #[test]
    fn signature_is_bound_to_call_name() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let at = Timestamp::new(1_700_000_000);
        let sig = sign_call(&kp.private, "submit_impact_score", at, PAYLOAD);
        assert!(!verify_call(&kp.identity(), "set_verifier", at, PAYLOAD, &sig));
    }

    #[test]
    fn signature_is_bound_to_issue_time() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let sig = sign_call(&kp.private, "register_claim", Timestamp::new(10), PAYLOAD);
        assert!(!verify_call(
            &kp.identity(),
            "register_claim",
            Timestamp::new(11),
            PAYLOAD,
            &sig
        ));
    }

    #[test]
    fn other_identity_cannot_claim_signature() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let other = keypair_from_seed(&[6u8; 32]);
        let at = Timestamp::new(0);
        let sig = sign_call(&kp.private, "register_claim", at, PAYLOAD);
        assert!(!verify_call(&other.identity(), "register_claim", at, PAYLOAD, &sig));
    }
}

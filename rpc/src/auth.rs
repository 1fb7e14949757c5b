//! Signed write calls.
//!
//! A write reaches the registry only after the server has checked that the
//! claimed signer produced the signature, that the call is fresh, and that it
//! has not been submitted before (see [`crate::replay`]). The signer then
//! becomes the caller of the registry operation.
//!
//! The signed bytes are the compact JSON of the payload with object keys in
//! sorted order, so clients and server agree on them regardless of how the
//! request body was formatted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use verileaf_crypto::{call_digest, sign_call, verify_call};
use verileaf_registry::CallContext;
use verileaf_types::{Identity, KeyPair, Signature, Timestamp};

use crate::error::RpcError;

/// Call names bound into the signed digest.
pub mod calls {
    pub const REGISTER_CLAIM: &str = "register_claim";
    pub const SUBMIT_IMPACT_SCORE: &str = "submit_impact_score";
    pub const SET_VERIFIER: &str = "set_verifier";

    pub const ALL: [&str; 3] = [REGISTER_CLAIM, SUBMIT_IMPACT_SCORE, SET_VERIFIER];
}

/// Payload of `register_claim`. `geometry` is hex-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterClaimCall {
    pub geometry: String,
    pub location_name: String,
}

/// Payload of `submit_impact_score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitImpactScoreCall {
    pub identity: Identity,
    pub score: u32,
}

/// Payload of `set_verifier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVerifierCall {
    pub new_verifier: Identity,
}

/// Request body of every write endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedCall {
    pub signer: Identity,
    /// Unix seconds at which the client signed the call.
    pub issued_at: u64,
    pub payload: Value,
    /// Hex-encoded Ed25519 signature.
    pub signature: String,
}

impl SignedCall {
    /// Sign `payload` as `call` on behalf of `keypair`.
    pub fn sign<P: Serialize>(
        keypair: &KeyPair,
        call: &str,
        issued_at: Timestamp,
        payload: &P,
    ) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_value(payload)?;
        let bytes = canonical_bytes(&payload)?;
        let signature = sign_call(&keypair.private, call, issued_at, &bytes);
        Ok(Self {
            signer: keypair.identity(),
            issued_at: issued_at.as_secs(),
            payload,
            signature: hex::encode(signature.as_bytes()),
        })
    }

    /// Digest this call was signed over, for single-use tracking.
    pub fn digest(&self, call: &str) -> Result<[u8; 32], RpcError> {
        let bytes = canonical_bytes(&self.payload)
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        Ok(call_digest(call, Timestamp::new(self.issued_at), &bytes))
    }

    /// Check signature and freshness, then decode the payload.
    ///
    /// Does not check single use; the server does that with a
    /// [`ReplayGuard`](crate::replay::ReplayGuard).
    ///
    /// On success returns the context the registry call runs under (the
    /// signer at the server's `now`) together with the typed payload.
    pub fn verify<P: DeserializeOwned>(
        &self,
        call: &str,
        now: Timestamp,
        max_skew_secs: u64,
    ) -> Result<(CallContext, P), RpcError> {
        let raw = hex::decode(&self.signature)
            .map_err(|e| RpcError::InvalidRequest(format!("signature is not hex: {e}")))?;
        let signature = Signature::from_slice(&raw)
            .ok_or_else(|| RpcError::InvalidRequest("signature must be 64 bytes".into()))?;

        let bytes = canonical_bytes(&self.payload)
            .map_err(|e| RpcError::InvalidRequest(e.to_string()))?;
        let issued_at = Timestamp::new(self.issued_at);
        if !verify_call(&self.signer, call, issued_at, &bytes, &signature) {
            return Err(RpcError::BadSignature);
        }

        let skew = now.distance(issued_at);
        if skew > max_skew_secs {
            return Err(RpcError::StaleCall {
                skew,
                limit: max_skew_secs,
            });
        }

        let payload = P::deserialize(&self.payload)
            .map_err(|e| RpcError::InvalidRequest(format!("bad {call} payload: {e}")))?;
        Ok((CallContext::new(self.signer, now), payload))
    }
}

/// The bytes a payload is signed over.
pub fn canonical_bytes(payload: &Value) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(payload)
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use verileaf_rpc::auth::{RegisterClaimCall, SetVerifierCall, SubmitImpactScoreCall};
use verileaf_rpc::{calls, SignedCall};
use verileaf_types::Timestamp;

// Arbitrary request bodies never panic the decoder or the verifier.
fuzz_target!(|data: &[u8]| {
    let Ok(call) = serde_json::from_slice::<SignedCall>(data) else {
        return;
    };
    let now = Timestamp::new(call.issued_at);
    let _ = call.verify::<RegisterClaimCall>(calls::REGISTER_CLAIM, now, 300);
    let _ = call.verify::<SubmitImpactScoreCall>(calls::SUBMIT_IMPACT_SCORE, now, 300);
    let _ = call.verify::<SetVerifierCall>(calls::SET_VERIFIER, now, 300);
});

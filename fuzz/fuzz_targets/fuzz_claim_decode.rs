#![no_main]

use libfuzzer_sys::fuzz_target;
use verileaf_registry::VegetationMetrics;
use verileaf_types::Claim;

// Stored claim bytes and metric summaries from disk never panic decoding.
fuzz_target!(|data: &[u8]| {
    if let Ok(claim) = bincode::deserialize::<Claim>(data) {
        let encoded = bincode::serialize(&claim).expect("decoded claim re-encodes");
        assert_eq!(bincode::deserialize::<Claim>(&encoded).ok(), Some(claim));
    }
    let _ = serde_json::from_slice::<VegetationMetrics>(data);
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use verileaf_types::Identity;

// Parsing arbitrary text never panics, and anything accepted re-encodes to
// the same text.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(identity) = Identity::parse(text) {
        assert_eq!(identity.encode(), text);
    }

    if data.len() >= 32 {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&data[..32]);
        let identity = Identity::new(bytes);
        assert_eq!(Identity::parse(&identity.encode()).ok(), Some(identity));
    }
});

//! Blake2b hashing.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"green valley"), blake2b_256(b"green valley"));
    }

    #[test]
    fn blake2b_different_inputs() {
        assert_ne!(blake2b_256(b"before"), blake2b_256(b"after"));
    }

    #[test]
    fn multi_matches_concatenation() {
        let joined = blake2b_256(b"helloworld");
        let parts = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(joined, parts);
    }
}

//! Registry identity: an Ed25519 public key with a `vlf_` text form.
//!
//! Text format: `vlf_` + base32(key, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: first 5 bytes of Blake2b-256(key).
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous chars).
//! Total length: 4 (prefix) + 52 + 8 = 64 characters.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::IdentityError;
use crate::keys::PublicKey;

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Characters for the key (256 bits → ceil(256/5) = 52).
const KEY_CHARS: usize = 52;
/// Characters after the prefix: 52 key + 8 checksum.
const ENCODED_LEN: usize = 60;

/// The key under which a claim and a score are stored.
///
/// An identity is the caller's Ed25519 public key. The all-zero key is the
/// null identity: it can never sign, and the registry refuses it wherever an
/// identity is supplied as an argument.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 32]);

impl Identity {
    /// The standard prefix for the text form.
    pub const PREFIX: &'static str = "vlf_";

    /// The null identity.
    pub const NULL: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(public_key.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The public key that must have signed calls made by this identity.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0)
    }

    /// Encode to the `vlf_` text form.
    pub fn encode(&self) -> String {
        let checksum = checksum(&self.0);
        let mut out = String::with_capacity(Self::PREFIX.len() + ENCODED_LEN);
        out.push_str(Self::PREFIX);
        out.push_str(&encode_base32(&self.0));
        out.push_str(&encode_base32(&checksum));
        out
    }

    /// Parse the `vlf_` text form, verifying the checksum.
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let encoded = s
            .strip_prefix(Self::PREFIX)
            .ok_or(IdentityError::MissingPrefix)?;
        if encoded.len() != ENCODED_LEN {
            return Err(IdentityError::WrongLength {
                expected: ENCODED_LEN,
                actual: encoded.len(),
            });
        }
        if !encoded.is_ascii() {
            return Err(IdentityError::InvalidCharacter);
        }
        let key: [u8; 32] =
            decode_base32_fixed(&encoded[..KEY_CHARS]).ok_or(IdentityError::InvalidCharacter)?;
        let sum: [u8; 5] =
            decode_base32_fixed(&encoded[KEY_CHARS..]).ok_or(IdentityError::InvalidCharacter)?;
        if sum != checksum(&key) {
            return Err(IdentityError::BadChecksum);
        }
        Ok(Self(key))
    }
}

fn checksum(key: &[u8; 32]) -> [u8; 5] {
    let digest = Blake2b::<U32>::digest(key);
    let mut out = [0u8; 5];
    out.copy_from_slice(&digest[..5]);
    out
}

/// Encode a byte slice as base32, zero-padding the final group on the right.
fn encode_base32(bytes: &[u8]) -> String {
    let mut result = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }
    result
}

/// Decode base32 into a fixed-size array. `None` on invalid characters, too
/// few bits, or non-zero padding bits (so every key has one text form).
fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        let val = *BASE32_DECODE.get(c as usize)?;
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            if pos < N {
                result[pos] = (buffer >> bits_in_buffer) as u8;
                pos += 1;
            }
        }
    }

    let padding = buffer & ((1u64 << bits_in_buffer) - 1);
    (pos == N && padding == 0).then_some(result)
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.encode())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<PublicKey> for Identity {
    fn from(key: PublicKey) -> Self {
        Self(key.0)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

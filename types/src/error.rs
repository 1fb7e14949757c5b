//! Error types for parsing and constructing the fundamental types.

use thiserror::Error;

/// Reasons an identity string fails to parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity must start with `vlf_`")]
    MissingPrefix,

    #[error("identity body must be {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("identity contains a character outside the base32 alphabet")]
    InvalidCharacter,

    #[error("identity checksum mismatch")]
    BadChecksum,
}

/// An impact score outside the inclusive range `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("impact score {0} is outside 0..=100")]
pub struct ScoreOutOfRange(pub u32);

use std::fmt;

use thiserror::Error;
use verileaf_store::StoreError;

/// A privileged role a caller can be required to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner,
    Verifier,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => f.write_str("owner"),
            Role::Verifier => f.write_str("verifier"),
        }
    }
}

/// Why a registry call was rejected. Every variant leaves state unchanged.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unauthorized: caller is not the {0}")]
    Unauthorized(Role),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("registry already constructed over this store")]
    AlreadyConstructed,

    #[error("store holds no registry; construct one first")]
    NotConstructed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RegistryError::InvalidArgument(reason.into())
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::Unauthorized(_) => "unauthorized",
            RegistryError::InvalidArgument(_) => "invalid_argument",
            RegistryError::AlreadyConstructed => "already_constructed",
            RegistryError::NotConstructed => "not_constructed",
            RegistryError::Store(_) => "store",
        }
    }
}

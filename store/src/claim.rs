//! Claim storage trait.

use std::sync::Arc;

use crate::StoreError;
use verileaf_types::{Claim, Identity, RegistryEvent};

/// Trait for the identity → claim mapping.
pub trait ClaimStore {
    /// The claim stored under `identity`, if one was ever written.
    fn get_claim(&self, identity: &Identity) -> Result<Option<Claim>, StoreError>;

    /// Replace the claim stored under `identity` and append `event` to the
    /// audit trail. Both land or neither does.
    fn put_claim(
        &self,
        identity: &Identity,
        claim: &Claim,
        event: &RegistryEvent,
    ) -> Result<(), StoreError>;

    /// Number of identities with a stored claim.
    fn claim_count(&self) -> Result<u64, StoreError>;
}

impl<T: ClaimStore + ?Sized> ClaimStore for &T {
    fn get_claim(&self, identity: &Identity) -> Result<Option<Claim>, StoreError> {
        (**self).get_claim(identity)
    }

    fn put_claim(
        &self,
        identity: &Identity,
        claim: &Claim,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        (**self).put_claim(identity, claim, event)
    }

    fn claim_count(&self) -> Result<u64, StoreError> {
        (**self).claim_count()
    }
}

impl<T: ClaimStore + ?Sized> ClaimStore for Arc<T> {
    fn get_claim(&self, identity: &Identity) -> Result<Option<Claim>, StoreError> {
        (**self).get_claim(identity)
    }

    fn put_claim(
        &self,
        identity: &Identity,
        claim: &Claim,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        (**self).put_claim(identity, claim, event)
    }

    fn claim_count(&self) -> Result<u64, StoreError> {
        (**self).claim_count()
    }
}

//! Impact score storage trait.

use std::sync::Arc;

use crate::StoreError;
use verileaf_types::{Identity, ImpactScore, RegistryEvent};

/// Trait for the identity → score mapping.
pub trait ScoreStore {
    /// The score stored under `identity`, if one was ever written.
    fn get_score(&self, identity: &Identity) -> Result<Option<ImpactScore>, StoreError>;

    /// Replace the score stored under `identity` and append `event` to the
    /// audit trail. Both land or neither does.
    fn put_score(
        &self,
        identity: &Identity,
        score: ImpactScore,
        event: &RegistryEvent,
    ) -> Result<(), StoreError>;

    /// Number of identities with a stored score.
    fn score_count(&self) -> Result<u64, StoreError>;
}

impl<T: ScoreStore + ?Sized> ScoreStore for &T {
    fn get_score(&self, identity: &Identity) -> Result<Option<ImpactScore>, StoreError> {
        (**self).get_score(identity)
    }

    fn put_score(
        &self,
        identity: &Identity,
        score: ImpactScore,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        (**self).put_score(identity, score, event)
    }

    fn score_count(&self) -> Result<u64, StoreError> {
        (**self).score_count()
    }
}

impl<T: ScoreStore + ?Sized> ScoreStore for Arc<T> {
    fn get_score(&self, identity: &Identity) -> Result<Option<ImpactScore>, StoreError> {
        (**self).get_score(identity)
    }

    fn put_score(
        &self,
        identity: &Identity,
        score: ImpactScore,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        (**self).put_score(identity, score, event)
    }

    fn score_count(&self) -> Result<u64, StoreError> {
        (**self).score_count()
    }
}

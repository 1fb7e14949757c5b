//! Audit trail storage trait.
//!
//! Entries are appended by the `put_*` calls of the other store traits, in
//! the same atomic write as the state change they record. This trait only
//! reads them back.

use std::sync::Arc;

use crate::StoreError;
use verileaf_types::RegistryEvent;

/// Read access to the append-only audit trail.
///
/// Sequence numbers are dense and start at 0.
pub trait EventStore {
    /// Number of recorded events.
    fn event_count(&self) -> Result<u64, StoreError>;

    /// Up to `limit` events starting at sequence `offset`, oldest first,
    /// each paired with its sequence number.
    fn events_from(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<(u64, RegistryEvent)>, StoreError>;
}

impl<T: EventStore + ?Sized> EventStore for &T {
    fn event_count(&self) -> Result<u64, StoreError> {
        (**self).event_count()
    }

    fn events_from(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<(u64, RegistryEvent)>, StoreError> {
        (**self).events_from(offset, limit)
    }
}

impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    fn event_count(&self) -> Result<u64, StoreError> {
        (**self).event_count()
    }

    fn events_from(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<(u64, RegistryEvent)>, StoreError> {
        (**self).events_from(offset, limit)
    }
}

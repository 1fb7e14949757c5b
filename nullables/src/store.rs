//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use verileaf_store::{ClaimStore, EventStore, RoleStore, Roles, ScoreStore, StoreError};
use verileaf_types::{Claim, Identity, ImpactScore, RegistryEvent};

/// An in-memory registry store for testing.
///
/// Thread-safe for use with tokio's multi-threaded runtime. Writes can be
/// made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct NullStore {
    claims: Mutex<HashMap<Identity, Claim>>,
    scores: Mutex<HashMap<Identity, ImpactScore>>,
    roles: Mutex<Option<Roles>>,
    events: Mutex<Vec<RegistryEvent>>,
    fail_writes: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every `put_*` returns a backend error and stores nothing,
    /// audit entry included.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store: writes disabled".into()));
        }
        Ok(())
    }

    fn record(&self, event: &RegistryEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl ClaimStore for NullStore {
    fn get_claim(&self, identity: &Identity) -> Result<Option<Claim>, StoreError> {
        Ok(self.claims.lock().unwrap().get(identity).cloned())
    }

    fn put_claim(
        &self,
        identity: &Identity,
        claim: &Claim,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        self.claims.lock().unwrap().insert(*identity, claim.clone());
        self.record(event);
        Ok(())
    }

    fn claim_count(&self) -> Result<u64, StoreError> {
        Ok(self.claims.lock().unwrap().len() as u64)
    }
}

impl ScoreStore for NullStore {
    fn get_score(&self, identity: &Identity) -> Result<Option<ImpactScore>, StoreError> {
        Ok(self.scores.lock().unwrap().get(identity).copied())
    }

    fn put_score(
        &self,
        identity: &Identity,
        score: ImpactScore,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        self.scores.lock().unwrap().insert(*identity, score);
        self.record(event);
        Ok(())
    }

    fn score_count(&self) -> Result<u64, StoreError> {
        Ok(self.scores.lock().unwrap().len() as u64)
    }
}

impl RoleStore for NullStore {
    fn get_roles(&self) -> Result<Option<Roles>, StoreError> {
        Ok(*self.roles.lock().unwrap())
    }

    fn put_roles(&self, roles: &Roles, event: &RegistryEvent) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.roles.lock().unwrap() = Some(*roles);
        self.record(event);
        Ok(())
    }
}

impl EventStore for NullStore {
    fn event_count(&self) -> Result<u64, StoreError> {
        Ok(self.events.lock().unwrap().len() as u64)
    }

    fn events_from(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<(u64, RegistryEvent)>, StoreError> {
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .enumerate()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit)
            .map(|(seq, event)| (seq as u64, event.clone()))
            .collect())
    }
}

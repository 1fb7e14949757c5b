//! LMDB implementation of ClaimStore.
//!
//! Keyed by the 32 identity bytes; values are bincode-encoded [`Claim`]s.
//! Each put also appends its audit entry in the same write transaction.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use verileaf_store::{ClaimStore, StoreError};
use verileaf_types::{Claim, Identity, RegistryEvent};

use crate::event::append_in;
use crate::LmdbError;

pub struct LmdbClaimStore {
    pub(crate) env: Arc<Env>,
    pub(crate) claims_db: Database<Bytes, Bytes>,
    pub(crate) events_db: Database<Bytes, Bytes>,
}

impl ClaimStore for LmdbClaimStore {
    fn get_claim(&self, identity: &Identity) -> Result<Option<Claim>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(bytes) = self
            .claims_db
            .get(&rtxn, identity.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let claim: Claim = bincode::deserialize(bytes).map_err(LmdbError::from)?;
        Ok(Some(claim))
    }

    fn put_claim(
        &self,
        identity: &Identity,
        claim: &Claim,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(claim).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.claims_db
            .put(&mut wtxn, identity.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        append_in(&mut wtxn, self.events_db, event)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn claim_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.claims_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

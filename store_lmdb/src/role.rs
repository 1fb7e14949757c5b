//! LMDB implementation of RoleStore.
//!
//! The owner and verifier are stored together under a single key so a role
//! update, together with its audit entry, is one write transaction.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use verileaf_store::{RoleStore, Roles, StoreError};
use verileaf_types::RegistryEvent;

use crate::event::append_in;
use crate::LmdbError;

const ROLES_KEY: &[u8] = b"roles";

pub struct LmdbRoleStore {
    pub(crate) env: Arc<Env>,
    pub(crate) roles_db: Database<Bytes, Bytes>,
    pub(crate) events_db: Database<Bytes, Bytes>,
}

impl RoleStore for LmdbRoleStore {
    fn get_roles(&self) -> Result<Option<Roles>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(bytes) = self
            .roles_db
            .get(&rtxn, ROLES_KEY)
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let roles: Roles = bincode::deserialize(bytes).map_err(LmdbError::from)?;
        Ok(Some(roles))
    }

    fn put_roles(&self, roles: &Roles, event: &RegistryEvent) -> Result<(), StoreError> {
        let bytes = bincode::serialize(roles).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.roles_db
            .put(&mut wtxn, ROLES_KEY, &bytes)
            .map_err(LmdbError::from)?;
        append_in(&mut wtxn, self.events_db, event)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

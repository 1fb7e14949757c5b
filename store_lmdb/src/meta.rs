//! Database metadata (schema version).

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbMetaStore {
    /// Stored schema version; 0 for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Corruption("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }
}

//! LMDB implementation of ScoreStore.
//!
//! Keyed by the 32 identity bytes; each value is the score as a single byte.
//! Each put also appends its audit entry in the same write transaction.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use verileaf_store::{ScoreStore, StoreError};
use verileaf_types::{Identity, ImpactScore, RegistryEvent};

use crate::event::append_in;
use crate::LmdbError;

pub struct LmdbScoreStore {
    pub(crate) env: Arc<Env>,
    pub(crate) scores_db: Database<Bytes, Bytes>,
    pub(crate) events_db: Database<Bytes, Bytes>,
}

impl ScoreStore for LmdbScoreStore {
    fn get_score(&self, identity: &Identity) -> Result<Option<ImpactScore>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let Some(bytes) = self
            .scores_db
            .get(&rtxn, identity.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let [raw] = bytes else {
            return Err(LmdbError::Corruption(format!(
                "score for {identity} is {} bytes",
                bytes.len()
            ))
            .into());
        };
        let score = ImpactScore::new(*raw as u32)
            .map_err(|e| LmdbError::Corruption(format!("score for {identity}: {e}")))?;
        Ok(Some(score))
    }

    fn put_score(
        &self,
        identity: &Identity,
        score: ImpactScore,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.scores_db
            .put(&mut wtxn, identity.as_bytes(), &[score.value()])
            .map_err(LmdbError::from)?;
        append_in(&mut wtxn, self.events_db, event)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn score_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.scores_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

//! LMDB audit trail.
//!
//! Keyed by the big-endian sequence number so keys sort in append order;
//! values are bincode-encoded [`EventRecord`]s. Entries are written only
//! through [`append_in`], inside the write transaction of the state change
//! they record.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RwTxn};
use serde::{Deserialize, Serialize};

use verileaf_store::{EventStore, StoreError};
use verileaf_types::{Identity, ImpactScore, RegistryEvent};

use crate::LmdbError;

/// On-disk form of a [`RegistryEvent`].
///
/// The wire type is internally tagged for JSON, which bincode cannot read
/// back, so the trail stores this externally tagged mirror with raw keys.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
enum EventRecord {
    VerifierUpdated {
        new_verifier: [u8; 32],
    },
    ClaimRegistered {
        identity: [u8; 32],
        location_name: String,
    },
    ScoreSubmitted {
        identity: [u8; 32],
        score: u8,
        submitted_by: [u8; 32],
    },
}

impl From<&RegistryEvent> for EventRecord {
    fn from(event: &RegistryEvent) -> Self {
        match event {
            RegistryEvent::VerifierUpdated { new_verifier } => Self::VerifierUpdated {
                new_verifier: *new_verifier.as_bytes(),
            },
            RegistryEvent::ClaimRegistered {
                identity,
                location_name,
            } => Self::ClaimRegistered {
                identity: *identity.as_bytes(),
                location_name: location_name.clone(),
            },
            RegistryEvent::ScoreSubmitted {
                identity,
                score,
                submitted_by,
            } => Self::ScoreSubmitted {
                identity: *identity.as_bytes(),
                score: score.value(),
                submitted_by: *submitted_by.as_bytes(),
            },
        }
    }
}

impl TryFrom<EventRecord> for RegistryEvent {
    type Error = LmdbError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        Ok(match record {
            EventRecord::VerifierUpdated { new_verifier } => Self::VerifierUpdated {
                new_verifier: Identity::new(new_verifier),
            },
            EventRecord::ClaimRegistered {
                identity,
                location_name,
            } => Self::ClaimRegistered {
                identity: Identity::new(identity),
                location_name,
            },
            EventRecord::ScoreSubmitted {
                identity,
                score,
                submitted_by,
            } => Self::ScoreSubmitted {
                identity: Identity::new(identity),
                score: ImpactScore::new(score as u32)
                    .map_err(|e| LmdbError::Corruption(format!("logged score: {e}")))?,
                submitted_by: Identity::new(submitted_by),
            },
        })
    }
}

pub struct LmdbEventStore {
    pub(crate) env: Arc<Env>,
    pub(crate) events_db: Database<Bytes, Bytes>,
}

/// Append `event` within `wtxn`, returning its sequence number.
pub(crate) fn append_in(
    wtxn: &mut RwTxn,
    events_db: Database<Bytes, Bytes>,
    event: &RegistryEvent,
) -> Result<u64, LmdbError> {
    let sequence = events_db.len(wtxn)?;
    let bytes = bincode::serialize(&EventRecord::from(event))?;
    events_db.put(wtxn, &sequence.to_be_bytes(), &bytes)?;
    Ok(sequence)
}

impl EventStore for LmdbEventStore {
    fn event_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.events_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn events_from(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<(u64, RegistryEvent)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.events_db.len(&rtxn).map_err(LmdbError::from)?;
        let end = offset.saturating_add(limit as u64).min(count);

        let mut events = Vec::with_capacity(end.saturating_sub(offset) as usize);
        for sequence in offset..end {
            let bytes = self
                .events_db
                .get(&rtxn, &sequence.to_be_bytes())
                .map_err(LmdbError::from)?
                .ok_or_else(|| LmdbError::Corruption(format!("audit trail gap at {sequence}")))?;
            let record: EventRecord = bincode::deserialize(bytes).map_err(LmdbError::from)?;
            events.push((sequence, RegistryEvent::try_from(record)?));
        }
        Ok(events)
    }
}

//! Single-use enforcement for signed calls.
//!
//! A signature only proves who issued a call and when. Without this guard the
//! same body could be posted again anywhere inside the freshness window and
//! would be applied again, undoing a later correction. The guard remembers
//! every accepted `(signer, digest)` pair until the freshness check alone
//! would refuse it, so memory stays bounded by the write rate times the
//! window.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use verileaf_types::{Identity, Timestamp};

use crate::error::RpcError;

type CallKey = (Identity, [u8; 32]);

#[derive(Default)]
struct Seen {
    set: HashSet<CallKey>,
    /// Keys in insertion order with the last second they could still pass
    /// the freshness check.
    order: VecDeque<(CallKey, u64)>,
}

impl Seen {
    fn expire(&mut self, now: u64) {
        while let Some(&(key, valid_until)) = self.order.front() {
            if valid_until >= now {
                break;
            }
            self.order.pop_front();
            self.set.remove(&key);
        }
    }
}

/// Set of recently accepted call digests, keyed by signer.
#[derive(Default)]
pub struct ReplayGuard {
    seen: Mutex<Seen>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call that passed signature and freshness checks.
    ///
    /// Fails with [`RpcError::ReplayedCall`] if `signer` already presented
    /// `digest`. The check and the insert happen under one lock, so two
    /// concurrent copies of a call cannot both pass. Entries are dropped once
    /// `now` is more than `window_secs` past their `issued_at`.
    pub fn check_and_record(
        &self,
        signer: Identity,
        digest: [u8; 32],
        issued_at: Timestamp,
        now: Timestamp,
        window_secs: u64,
    ) -> Result<(), RpcError> {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.expire(now.as_secs());

        let key = (signer, digest);
        if !seen.set.insert(key) {
            return Err(RpcError::ReplayedCall);
        }
        let valid_until = issued_at.as_secs().saturating_add(window_secs);
        seen.order.push_back((key, valid_until));
        Ok(())
    }

    /// Number of calls currently remembered.
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

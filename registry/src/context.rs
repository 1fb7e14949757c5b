//! Explicit per-call context.

use verileaf_types::{Identity, Timestamp};

/// Who is calling and when.
///
/// Built by the transport only after it has authenticated the caller (for the
/// RPC server: after verifying the call signature). The registry trusts it as
/// given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Identity,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Identity, now: Timestamp) -> Self {
        Self { caller, now }
    }
}

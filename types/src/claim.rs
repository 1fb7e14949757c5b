//! Geographic claim record.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// The claim currently registered under an identity.
///
/// `Claim::default()` is the absent record returned for identities that never
/// registered: empty geometry, empty name, epoch timestamp, `present = false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Opaque polygon encoding (a serialized GeoJSON Feature in practice).
    pub geometry: Vec<u8>,
    /// Human-readable label for the claimed area.
    pub location_name: String,
    /// When the claim was last (re)written.
    pub registered_at: Timestamp,
    /// Distinguishes a registered claim from the zero record.
    pub present: bool,
}

impl Claim {
    /// Build a registered claim.
    pub fn registered(geometry: Vec<u8>, location_name: String, at: Timestamp) -> Self {
        Self {
            geometry,
            location_name,
            registered_at: at,
            present: true,
        }
    }

    /// The record returned for an identity with no claim.
    pub fn absent() -> Self {
        Self::default()
    }
}

//! Notifications emitted by successful registry writes.

use serde::{Deserialize, Serialize};

use crate::{Identity, ImpactScore};

/// One entry in the registry's append-only audit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// The verifier role was set, at construction or by rotation.
    VerifierUpdated { new_verifier: Identity },
    /// An identity registered or replaced its claim.
    ClaimRegistered {
        identity: Identity,
        location_name: String,
    },
    /// The verifier wrote a score.
    ScoreSubmitted {
        identity: Identity,
        score: ImpactScore,
        submitted_by: Identity,
    },
}

impl RegistryEvent {
    /// Short kind name, used for metrics labels and WebSocket topics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VerifierUpdated { .. } => "verifier_updated",
            Self::ClaimRegistered { .. } => "claim_registered",
            Self::ScoreSubmitted { .. } => "score_submitted",
        }
    }

    /// Identities this event concerns, for subscription filtering.
    pub fn identities(&self) -> Vec<Identity> {
        match self {
            Self::VerifierUpdated { new_verifier } => vec![*new_verifier],
            Self::ClaimRegistered { identity, .. } => vec![*identity],
            Self::ScoreSubmitted {
                identity,
                submitted_by,
                ..
            } => vec![*identity, *submitted_by],
        }
    }
}

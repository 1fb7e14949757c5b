//! The registry state machine.
//!
//! Every write follows the same order: role check, argument validation, one
//! store write, one notification. The store write carries the audit trail
//! entry with it, so state and trail change together. A rejected call returns
//! before the store is touched, and a failed store write returns before the
//! notification, so a call either fully applies or leaves state, trail and
//! listeners untouched.

use tracing::{debug, info};

use verileaf_store::{RegistryStore, Roles};
use verileaf_types::{Claim, Identity, ImpactScore, RegistryEvent};

use crate::context::CallContext;
use crate::error::{RegistryError, Role};
use crate::log::{EventLog, LoggedEvent};

/// Claim-and-score registry over a storage backend `S`, notifying `L`.
///
/// Write methods take `&mut self`: the host serializes writes by owning the
/// registry behind a single lock.
pub struct Registry<S, L> {
    store: S,
    log: L,
    roles: Roles,
}

impl<S: RegistryStore, L: EventLog> Registry<S, L> {
    /// Create a registry over an empty store.
    ///
    /// The caller becomes the permanent owner. The verifier is
    /// `initial_verifier` unless that is absent or null, in which case the
    /// caller takes the role too.
    pub fn construct(
        store: S,
        log: L,
        ctx: &CallContext,
        initial_verifier: Option<Identity>,
    ) -> Result<Self, RegistryError> {
        if store.get_roles()?.is_some() {
            return Err(RegistryError::AlreadyConstructed);
        }

        let verifier = initial_verifier
            .filter(|v| !v.is_null())
            .unwrap_or(ctx.caller);
        let roles = Roles {
            owner: ctx.caller,
            verifier,
        };
        let event = RegistryEvent::VerifierUpdated {
            new_verifier: verifier,
        };
        store.put_roles(&roles, &event)?;
        log.append(&event);

        info!(owner = %roles.owner, verifier = %roles.verifier, "registry constructed");
        Ok(Self { store, log, roles })
    }

    /// Reopen a registry previously constructed over `store`.
    pub fn open(store: S, log: L) -> Result<Self, RegistryError> {
        let roles = store.get_roles()?.ok_or(RegistryError::NotConstructed)?;
        info!(owner = %roles.owner, verifier = %roles.verifier, "registry opened");
        Ok(Self { store, log, roles })
    }

    /// Hand the verifier role to `new_verifier`. Owner only.
    ///
    /// Re-setting the current verifier changes nothing but still notifies.
    pub fn set_verifier(
        &mut self,
        ctx: &CallContext,
        new_verifier: Identity,
    ) -> Result<(), RegistryError> {
        self.require(ctx, Role::Owner)?;
        if new_verifier.is_null() {
            return Err(RegistryError::invalid(
                "verifier must not be the null identity",
            ));
        }

        let roles = Roles {
            verifier: new_verifier,
            ..self.roles
        };
        let event = RegistryEvent::VerifierUpdated { new_verifier };
        self.store.put_roles(&roles, &event)?;
        self.roles = roles;
        self.log.append(&event);

        info!(verifier = %new_verifier, "verifier updated");
        Ok(())
    }

    /// Register or replace the caller's own claim.
    pub fn register_claim(
        &mut self,
        ctx: &CallContext,
        geometry: Vec<u8>,
        location_name: String,
    ) -> Result<(), RegistryError> {
        if geometry.is_empty() {
            return Err(RegistryError::invalid("geometry must not be empty"));
        }
        if location_name.is_empty() {
            return Err(RegistryError::invalid("location name must not be empty"));
        }

        let claim = Claim::registered(geometry, location_name, ctx.now);
        let event = RegistryEvent::ClaimRegistered {
            identity: ctx.caller,
            location_name: claim.location_name.clone(),
        };
        self.store.put_claim(&ctx.caller, &claim, &event)?;
        self.log.append(&event);

        info!(
            identity = %ctx.caller,
            location = %claim.location_name,
            geometry_bytes = claim.geometry.len(),
            "claim registered"
        );
        Ok(())
    }

    /// Write the impact score of `identity`. Verifier only.
    ///
    /// No claim is required to exist for `identity`.
    pub fn submit_impact_score(
        &mut self,
        ctx: &CallContext,
        identity: Identity,
        score: u32,
    ) -> Result<(), RegistryError> {
        self.require(ctx, Role::Verifier)?;
        if identity.is_null() {
            return Err(RegistryError::invalid("identity must not be null"));
        }
        let score =
            ImpactScore::new(score).map_err(|e| RegistryError::invalid(e.to_string()))?;

        let event = RegistryEvent::ScoreSubmitted {
            identity,
            score,
            submitted_by: ctx.caller,
        };
        self.store.put_score(&identity, score, &event)?;
        self.log.append(&event);

        info!(identity = %identity, score = score.value(), verifier = %ctx.caller, "score submitted");
        Ok(())
    }

    /// The claim of `identity`, or the zero record if it never registered.
    pub fn get_claim(&self, identity: &Identity) -> Result<Claim, RegistryError> {
        Ok(self.store.get_claim(identity)?.unwrap_or_default())
    }

    /// The score of `identity`; zero if never scored.
    pub fn score_of(&self, identity: &Identity) -> Result<ImpactScore, RegistryError> {
        Ok(self.store.get_score(identity)?.unwrap_or_default())
    }

    /// Up to `limit` audit trail entries from sequence `offset`, oldest first.
    pub fn events(&self, offset: u64, limit: usize) -> Result<Vec<LoggedEvent>, RegistryError> {
        Ok(self
            .store
            .events_from(offset, limit)?
            .into_iter()
            .map(|(sequence, event)| LoggedEvent { sequence, event })
            .collect())
    }

    /// Number of entries in the audit trail.
    pub fn event_count(&self) -> Result<u64, RegistryError> {
        Ok(self.store.event_count()?)
    }

    pub fn owner(&self) -> Identity {
        self.roles.owner
    }

    pub fn verifier(&self) -> Identity {
        self.roles.verifier
    }

    pub fn roles(&self) -> Roles {
        self.roles
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    fn require(&self, ctx: &CallContext, role: Role) -> Result<(), RegistryError> {
        let holder = match role {
            Role::Owner => self.roles.owner,
            Role::Verifier => self.roles.verifier,
        };
        if ctx.caller != holder {
            debug!(caller = %ctx.caller, required = %role, "rejected unauthorized call");
            return Err(RegistryError::Unauthorized(role));
        }
        Ok(())
    }
}

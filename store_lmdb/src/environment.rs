//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use verileaf_store::{ClaimStore, EventStore, RoleStore, Roles, ScoreStore, StoreError};
use verileaf_types::{Claim, Identity, ImpactScore, RegistryEvent};

use crate::claim::LmdbClaimStore;
use crate::event::LmdbEventStore;
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::role::LmdbRoleStore;
use crate::score::LmdbScoreStore;
use crate::LmdbError;

/// Number of named databases the registry uses.
const MAX_DBS: u32 = 5;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
///
/// Implements every registry storage trait by delegating to the per-database
/// stores, so it can be handed to the registry directly.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    claims: LmdbClaimStore,
    scores: LmdbScoreStore,
    roles: LmdbRoleStore,
    events: LmdbEventStore,
    meta: LmdbMetaStore,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: the environment directory is owned by this process; nothing
        // else maps the same files with different options.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };
        let env = Arc::new(env);

        let mut wtxn = env.write_txn()?;
        let claims_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("claims"))?;
        let scores_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("scores"))?;
        let roles_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("roles"))?;
        let events_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("events"))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let store = Self {
            claims: LmdbClaimStore {
                env: env.clone(),
                claims_db,
                events_db,
            },
            scores: LmdbScoreStore {
                env: env.clone(),
                scores_db,
                events_db,
            },
            roles: LmdbRoleStore {
                env: env.clone(),
                roles_db,
                events_db,
            },
            events: LmdbEventStore {
                env: env.clone(),
                events_db,
            },
            meta: LmdbMetaStore {
                env: env.clone(),
                meta_db,
            },
            env,
        };

        Migrator::run(&store.meta)?;
        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(store)
    }

    pub fn meta(&self) -> &LmdbMetaStore {
        &self.meta
    }

    /// Flush dirty pages to disk.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}

impl ClaimStore for LmdbEnvironment {
    fn get_claim(&self, identity: &Identity) -> Result<Option<Claim>, StoreError> {
        self.claims.get_claim(identity)
    }

    fn put_claim(
        &self,
        identity: &Identity,
        claim: &Claim,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        self.claims.put_claim(identity, claim, event)
    }

    fn claim_count(&self) -> Result<u64, StoreError> {
        self.claims.claim_count()
    }
}

impl ScoreStore for LmdbEnvironment {
    fn get_score(&self, identity: &Identity) -> Result<Option<ImpactScore>, StoreError> {
        self.scores.get_score(identity)
    }

    fn put_score(
        &self,
        identity: &Identity,
        score: ImpactScore,
        event: &RegistryEvent,
    ) -> Result<(), StoreError> {
        self.scores.put_score(identity, score, event)
    }

    fn score_count(&self) -> Result<u64, StoreError> {
        self.scores.score_count()
    }
}

impl RoleStore for LmdbEnvironment {
    fn get_roles(&self) -> Result<Option<Roles>, StoreError> {
        self.roles.get_roles()
    }

    fn put_roles(&self, roles: &Roles, event: &RegistryEvent) -> Result<(), StoreError> {
        self.roles.put_roles(roles, event)
    }
}

impl EventStore for LmdbEnvironment {
    fn event_count(&self) -> Result<u64, StoreError> {
        self.events.event_count()
    }

    fn events_from(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<(u64, RegistryEvent)>, StoreError> {
        self.events.events_from(offset, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::CURRENT_SCHEMA_VERSION;
    use verileaf_types::Timestamp;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    fn id(byte: u8) -> Identity {
        Identity::new([byte; 32])
    }

    fn claimed(identity: Identity, location_name: &str) -> RegistryEvent {
        RegistryEvent::ClaimRegistered {
            identity,
            location_name: location_name.into(),
        }
    }

    fn scored(identity: Identity, score: ImpactScore) -> RegistryEvent {
        RegistryEvent::ScoreSubmitted {
            identity,
            score,
            submitted_by: id(9),
        }
    }

    #[test]
    fn fresh_environment_is_empty() {
        let (_dir, env) = temp_env();
        assert!(env.get_roles().unwrap().is_none());
        assert!(env.get_claim(&id(1)).unwrap().is_none());
        assert!(env.get_score(&id(1)).unwrap().is_none());
        assert_eq!(env.claim_count().unwrap(), 0);
        assert_eq!(env.score_count().unwrap(), 0);
        assert_eq!(env.event_count().unwrap(), 0);
    }

    #[test]
    fn claim_put_get_and_overwrite() {
        let (_dir, env) = temp_env();
        let first = Claim::registered(b"{\"a\":1}".to_vec(), "North".into(), Timestamp::new(5));
        let second = Claim::registered(b"{\"b\":2}".to_vec(), "South".into(), Timestamp::new(9));
        env.put_claim(&id(1), &first, &claimed(id(1), "North")).unwrap();
        env.put_claim(&id(1), &second, &claimed(id(1), "South")).unwrap();
        assert_eq!(env.get_claim(&id(1)).unwrap(), Some(second));
        assert_eq!(env.claim_count().unwrap(), 1);
    }

    #[test]
    fn score_put_get() {
        let (_dir, env) = temp_env();
        let score = ImpactScore::new(87).unwrap();
        env.put_score(&id(2), score, &scored(id(2), score)).unwrap();
        assert_eq!(env.get_score(&id(2)).unwrap(), Some(ImpactScore::new(87).unwrap()));
        assert!(env.get_score(&id(3)).unwrap().is_none());
    }

    #[test]
    fn roles_put_get() {
        let (_dir, env) = temp_env();
        let roles = Roles {
            owner: id(1),
            verifier: id(2),
        };
        let event = RegistryEvent::VerifierUpdated {
            new_verifier: id(2),
        };
        env.put_roles(&roles, &event).unwrap();
        assert_eq!(env.get_roles().unwrap(), Some(roles));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            env.put_score(&id(4), ImpactScore::MAX, &scored(id(4), ImpactScore::MAX))
                .unwrap();
            env.sync().unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(env.get_score(&id(4)).unwrap(), Some(ImpactScore::MAX));
    }

    #[test]
    fn every_put_appends_to_the_trail_in_order() {
        let (_dir, env) = temp_env();
        let roles = Roles {
            owner: id(1),
            verifier: id(2),
        };
        let rotated = RegistryEvent::VerifierUpdated {
            new_verifier: id(2),
        };
        let claim = Claim::registered(b"{}".to_vec(), "Delta".into(), Timestamp::new(1));
        let score = ImpactScore::new(40).unwrap();

        env.put_roles(&roles, &rotated).unwrap();
        env.put_claim(&id(3), &claim, &claimed(id(3), "Delta")).unwrap();
        env.put_score(&id(3), score, &scored(id(3), score)).unwrap();

        assert_eq!(env.event_count().unwrap(), 3);
        assert_eq!(
            env.events_from(0, 10).unwrap(),
            vec![
                (0, rotated),
                (1, claimed(id(3), "Delta")),
                (2, scored(id(3), score)),
            ]
        );
    }

    #[test]
    fn trail_pages_by_sequence() {
        let (_dir, env) = temp_env();
        for n in 0..5u8 {
            let claim = Claim::registered(b"{}".to_vec(), format!("L{n}"), Timestamp::new(1));
            env.put_claim(&id(n + 1), &claim, &claimed(id(n + 1), &format!("L{n}")))
                .unwrap();
        }
        let page = env.events_from(3, 10).unwrap();
        assert_eq!(page.iter().map(|(seq, _)| *seq).collect::<Vec<_>>(), vec![3, 4]);
        assert!(env.events_from(5, 10).unwrap().is_empty());
        assert!(env.events_from(u64::MAX, 10).unwrap().is_empty());
        assert_eq!(env.events_from(1, 2).unwrap().len(), 2);
    }

    #[test]
    fn trail_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let score = ImpactScore::new(55).unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            let claim = Claim::registered(b"{}".to_vec(), "Keep".into(), Timestamp::new(2));
            env.put_claim(&id(5), &claim, &claimed(id(5), "Keep")).unwrap();
            env.put_score(&id(5), score, &scored(id(5), score)).unwrap();
            env.sync().unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(
            env.events_from(0, 10).unwrap(),
            vec![(0, claimed(id(5), "Keep")), (1, scored(id(5), score))]
        );
    }

    #[test]
    fn open_records_schema_version() {
        let (_dir, env) = temp_env();
        assert_eq!(env.meta().schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            env.meta().set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
        }
        let result = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024);
        assert!(matches!(result, Err(LmdbError::SchemaTooNew { .. })));
    }
}

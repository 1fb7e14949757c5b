//! Schema version check run when the environment is opened.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration steps to bring an older database up to date.

use crate::meta::LmdbMetaStore;
use crate::LmdbError;

/// The schema version that the current code writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

pub struct Migrator;

impl Migrator {
    /// Bring the database to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// A database written by a newer release is refused rather than read with
    /// the wrong layout.
    pub fn run(meta: &LmdbMetaStore) -> Result<(), LmdbError> {
        let current = meta.schema_version()?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        meta.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Blank slate: databases are created by the environment itself.
        (0, 1) => Ok(()),
        // Adds the `events` database, which the environment creates on open.
        // Stores written before it start with an empty audit trail.
        (1, 2) => Ok(()),
        _ => Err(LmdbError::Heed(format!("unknown migration: {from} -> {to}"))),
    }
}

pub mod introspect;
pub mod models;
pub mod operations;
pub mod schema;

use std::time::Duration;

use diesel::Connection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};

use crate::config::{StoreConfig, Target};
use crate::error::{Result, StoreError};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Bookkeeping table diesel creates next to the schema.
pub const MIGRATIONS_TABLE: &str = "__diesel_schema_migrations";

/// Drops the declared tables whether or not diesel recorded creating them.
const DROP_SCHEMA_SQL: &str =
    include_str!("../../migrations/2024-01-01-000000_create_workout_schema/down.sql");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Pragmas applied to every connection the pool hands out.
#[derive(Debug)]
struct ConnectionPragmas {
    busy_timeout: Duration,
    wal: bool,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        let mut pragmas = format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        );
        if self.wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        }
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Handle on a provisioned database. The pool lives as long as the handle.
pub struct Store {
    pool: DbPool,
    target: Target,
}

impl Store {
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let target = config.target()?;
        let pool_size = config.pool_size()?;
        let is_memory = target == Target::Memory;
        debug!(
            "Opening {} with up to {} connection(s)",
            target.connection_string(),
            pool_size
        );

        let manager = ConnectionManager::<SqliteConnection>::new(target.connection_string());
        let mut builder = DbPool::builder()
            .max_size(pool_size)
            .connection_timeout(config.connect_timeout)
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout: config.busy_timeout,
                wal: !is_memory,
            }));
        if is_memory {
            // the database disappears with its only connection
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager)?;

        Ok(Self { pool, target })
    }

    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Creates every table that is missing. Safe to call repeatedly.
    pub fn setup(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(StoreError::Migration)?;
        for version in &applied {
            debug!("Applied migration {}", version);
        }
        info!(
            "Schema ready on {} ({} migration(s) applied)",
            self.target.connection_string(),
            applied.len()
        );
        Ok(())
    }

    /// Drops every table, then closes the pool.
    pub fn cleanup(self) -> Result<()> {
        let reverted = self.drop_schema()?;
        info!(
            "Dropped schema on {} ({} migration(s) reverted)",
            self.target.connection_string(),
            reverted
        );
        Ok(())
    }

    /// Reverts the recorded migrations, then drops whatever declared tables
    /// and bookkeeping remain. Returns how many recorded migrations were reverted.
    fn drop_schema(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let reverted: Vec<String> = conn
            .revert_all_migrations(MIGRATIONS)
            .map_err(StoreError::Migration)?
            .iter()
            .map(|version| version.to_string())
            .collect();
        for version in &reverted {
            debug!("Reverted migration {}", version);
        }

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            conn.batch_execute(DROP_SCHEMA_SQL)?;
            conn.batch_execute(&format!("DROP TABLE IF EXISTS {};", MIGRATIONS_TABLE))
        })?;
        Ok(reverted.len())
    }
}

/// Connects to `connection_target` and creates the schema. The returned
/// store keeps its connections open until it is dropped.
pub fn setup_db(connection_target: &str) -> Result<Store> {
    let store = Store::connect(&StoreConfig::new(connection_target))?;
    store.setup()?;
    Ok(store)
}

/// Connects to `connection_target`, drops the schema and releases the connection.
pub fn cleanup_db(connection_target: &str) -> Result<()> {
    Store::connect(&StoreConfig::new(connection_target))?.cleanup()
}

#[cfg(test)]
pub(crate) fn test_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("liftbook.db");
    let store = setup_db(path.to_str().unwrap()).unwrap();
    (dir, store)
}

#[cfg(test)]
mod tests {
    use super::introspect::{foreign_keys_enabled, list_tables, table_columns, table_exists};
    use super::*;

    const ALL_TABLES: [&str; 10] = [
        "exercise",
        "exercise_muscle",
        "exercise_set",
        "muscle",
        "plan",
        "set",
        "user",
        "user_workout",
        "workout",
        "workout_set",
    ];

    #[test]
    fn setup_creates_every_table() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        assert_eq!(list_tables(&mut conn)?, ALL_TABLES);
        Ok(())
    }

    #[test]
    fn setup_is_idempotent() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        store.setup()?;
        store.setup()?;

        let mut conn = store.conn()?;
        assert_eq!(list_tables(&mut conn)?.len(), ALL_TABLES.len());
        Ok(())
    }

    fn nullable(conn: &mut SqliteConnection, table: &str) -> anyhow::Result<Vec<String>> {
        Ok(table_columns(conn, table)?
            .into_iter()
            .filter(|c| !c.not_null)
            .map(|c| c.name)
            .collect())
    }

    #[test]
    fn declared_nullability_is_applied() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut conn = store.conn()?;

        assert_eq!(nullable(&mut conn, "workout")?, ["name"]);
        assert_eq!(nullable(&mut conn, "plan")?, ["description"]);
        assert_eq!(nullable(&mut conn, "exercise")?, ["instructions"]);
        assert!(nullable(&mut conn, "user")?.is_empty());
        assert!(nullable(&mut conn, "set")?.is_empty());
        assert!(nullable(&mut conn, "muscle")?.is_empty());
        Ok(())
    }

    #[test]
    fn cleanup_drops_every_table() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("liftbook.db");
        let target = path.to_str().unwrap();

        drop(setup_db(target)?);
        cleanup_db(target)?;

        let store = Store::connect(&StoreConfig::new(target))?;
        let mut conn = store.conn()?;
        assert!(list_tables(&mut conn)?.is_empty());
        Ok(())
    }

    #[test]
    fn schema_can_be_recreated_after_cleanup() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = format!("sqlite://{}", dir.path().join("liftbook.db").display());

        setup_db(&target)?.cleanup()?;
        let store = setup_db(&target)?;

        let mut conn = store.conn()?;
        assert_eq!(list_tables(&mut conn)?, ALL_TABLES);
        Ok(())
    }

    #[test]
    fn in_memory_schema_survives_checkouts() -> anyhow::Result<()> {
        let store = setup_db(":memory:")?;
        {
            let mut conn = store.conn()?;
            assert_eq!(list_tables(&mut conn)?.len(), ALL_TABLES.len());
        }
        let mut conn = store.conn()?;
        assert_eq!(list_tables(&mut conn)?.len(), ALL_TABLES.len());
        Ok(())
    }

    #[test]
    fn cleanup_drops_tables_missing_from_the_migration_record() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        {
            let mut conn = store.conn()?;
            conn.batch_execute(&format!("DELETE FROM {};", MIGRATIONS_TABLE))?;
        }

        assert_eq!(store.drop_schema()?, 0);

        let mut conn = store.conn()?;
        assert!(list_tables(&mut conn)?.is_empty());
        assert!(!table_exists(&mut conn, MIGRATIONS_TABLE)?);
        Ok(())
    }

    #[test]
    fn in_memory_schema_can_be_torn_down() -> anyhow::Result<()> {
        let store = setup_db(":memory:")?;
        assert_eq!(store.drop_schema()?, 1);
        {
            let mut conn = store.conn()?;
            assert!(list_tables(&mut conn)?.is_empty());
            assert!(!table_exists(&mut conn, MIGRATIONS_TABLE)?);
        }
        store.cleanup()?;

        cleanup_db(":memory:")?;
        cleanup_db("sqlite://:memory:")?;
        Ok(())
    }

    #[test]
    fn memory_uris_never_hand_out_an_empty_database() -> anyhow::Result<()> {
        for target in ["sqlite://:memory:", "file::memory:", "file:lifts?mode=memory"] {
            let config =
                StoreConfig::new(target).with_connect_timeout(Duration::from_millis(200));
            let store = Store::connect(&config)?;
            store.setup()?;

            let mut first = store.conn()?;
            assert_eq!(list_tables(&mut first)?.len(), ALL_TABLES.len(), "{target}");
            // a second simultaneous checkout waits for the only connection
            assert!(
                matches!(store.conn(), Err(StoreError::Connection(_))),
                "{target}"
            );
            drop(first);

            let mut second = store.conn()?;
            assert_eq!(list_tables(&mut second)?.len(), ALL_TABLES.len(), "{target}");
        }
        Ok(())
    }

    #[test]
    fn every_connection_enforces_foreign_keys() -> anyhow::Result<()> {
        let (_dir, store) = test_store();
        let mut first = store.conn()?;
        let mut second = store.conn()?;

        assert!(foreign_keys_enabled(&mut first)?);
        assert!(foreign_keys_enabled(&mut second)?);
        Ok(())
    }

    #[test]
    fn malformed_target_is_rejected() {
        let err = setup_db("mysql://root@localhost/lift").err().unwrap();
        assert!(matches!(err, StoreError::InvalidTarget(_)));
    }

    #[test]
    fn unreachable_target_fails_to_connect() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing").join("liftbook.db");
        let config = StoreConfig::new(path.to_str().unwrap())
            .with_connect_timeout(Duration::from_millis(200));

        let err = Store::connect(&config).err().unwrap();
        assert!(matches!(err, StoreError::Connection(_)));
        Ok(())
    }
}

//! Connection pool management for SQLite via r2d2.
//!
//! Pools are plain values owned by the caller. Every connection handed out
//! has foreign keys enforced and a busy timeout applied; file-backed pools
//! also run in WAL journal mode. When statement logging is enabled, each
//! statement executed on a pooled connection is reported through
//! `tracing` under the `chardb_db::sql` target.

use std::time::Duration;

use chardb_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::migrations;
use crate::schema::SchemaRegistry;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Per-pool connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Emit every executed statement and its duration at debug level.
    pub log_statements: bool,
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_statements: false,
            busy_timeout_ms: 5000,
            max_connections: 4,
        }
    }
}

fn log_statement(sql: &str, elapsed: Duration) {
    tracing::debug!(target: "chardb_db::sql", ?elapsed, "{}", sql.trim());
}

fn configure(
    conn: &mut Connection,
    diagnostics: DiagnosticsConfig,
    wal: bool,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    if wal {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
    }
    conn.busy_timeout(Duration::from_millis(diagnostics.busy_timeout_ms))?;
    if diagnostics.log_statements {
        conn.profile(Some(log_statement));
    }
    Ok(())
}

fn build_pool(manager: SqliteConnectionManager, diagnostics: DiagnosticsConfig) -> Result<DbPool> {
    if diagnostics.max_connections == 0 {
        return Err(Error::connection("Pool needs at least one connection"));
    }

    Pool::builder()
        .max_size(diagnostics.max_connections)
        .build(manager)
        .map_err(|e| Error::connection(format!("Failed to create connection pool: {e}")))
}

/// Open a pool to a database file without touching its schema.
///
/// The file is created if it does not exist. The location is probed once
/// up front so an unreachable path fails immediately instead of waiting
/// out the pool's checkout timeout.
///
/// Pools opened this way are independent: a second pool to the same
/// location with statement logging enabled does not affect the first.
pub fn open(location: &str, diagnostics: DiagnosticsConfig) -> Result<DbPool> {
    if location.trim().is_empty() {
        return Err(Error::connection("Database location is empty"));
    }

    Connection::open(location)
        .map_err(|e| Error::connection(format!("Failed to open database {location}: {e}")))?;

    let manager = SqliteConnectionManager::file(location)
        .with_init(move |conn| configure(conn, diagnostics, true));
    build_pool(manager, diagnostics)
}

/// Open a database file and bring its schema up to date.
///
/// Uses the standard character registry and default diagnostics.
///
/// # Example
///
/// ```no_run
/// use chardb_db::pool::initialize;
///
/// let pool = initialize("/var/lib/chardb/chardb.db").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn initialize(location: &str) -> Result<DbPool> {
    initialize_with(
        location,
        &SchemaRegistry::standard(),
        DiagnosticsConfig::default(),
    )
}

/// Open a database file and converge it to an explicit registry.
///
/// Pool failures are reported as [`Error::Connection`], schema failures
/// as [`Error::Migration`]. Both are fatal to a caller starting up.
pub fn initialize_with(
    location: &str,
    registry: &SchemaRegistry,
    diagnostics: DiagnosticsConfig,
) -> Result<DbPool> {
    let pool = open(location, diagnostics)?;

    let conn = get_conn(&pool)?;
    let report = migrations::run_migrations(&conn, registry)?;
    tracing::info!(
        location,
        tables_created = report.tables_created,
        columns_added = report.columns_added,
        indexes_created = report.indexes_created,
        "Database ready"
    );
    drop(conn);

    Ok(pool)
}

/// Initialize an in-memory database pool (useful for tests).
///
/// Each call creates a uniquely-named shared-cache in-memory database so
/// that parallel tests do not interfere with each other, while all
/// connections *within* a single pool still share state.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:memdb_{n}?mode=memory&cache=shared");

    let diagnostics = DiagnosticsConfig::default();
    let manager = SqliteConnectionManager::file(uri)
        .with_init(move |conn| configure(conn, diagnostics, false));
    let pool = build_pool(manager, diagnostics)?;

    let conn = get_conn(&pool)?;
    migrations::run_migrations(&conn, &SchemaRegistry::standard())?;
    drop(conn);

    Ok(pool)
}

/// Convenience helper to get a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::connection(format!("Failed to get connection from pool: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Records the target of every event it sees.
    #[derive(Clone, Default)]
    struct CapturedTargets(Arc<Mutex<Vec<String>>>);

    impl CapturedTargets {
        fn count(&self, target: &str) -> usize {
            self.0.lock().unwrap().iter().filter(|t| *t == target).count()
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for CapturedTargets {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0
                .lock()
                .unwrap()
                .push(event.metadata().target().to_string());
        }
    }

    fn run_statements(location: &str, diagnostics: DiagnosticsConfig) -> CapturedTargets {
        let captured = CapturedTargets::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            let pool = open(location, diagnostics).unwrap();
            let conn = get_conn(&pool).unwrap();
            conn.execute("UPDATE characters SET level = level WHERE id = 0", [])
                .unwrap();
            let _: i64 = conn
                .query_row("SELECT COUNT(*) FROM characters", [], |row| row.get(0))
                .unwrap();
        });
        captured
    }

    #[test]
    fn test_log_statements_emits_sql_events() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chars.db");
        let location = path.to_str().unwrap();
        initialize(location).unwrap();

        let diagnostics = DiagnosticsConfig {
            log_statements: true,
            ..DiagnosticsConfig::default()
        };
        let captured = run_statements(location, diagnostics);
        assert!(captured.count("chardb_db::sql") >= 2);
    }

    #[test]
    fn test_statements_silent_by_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chars.db");
        let location = path.to_str().unwrap();
        initialize(location).unwrap();

        let captured = run_statements(location, DiagnosticsConfig::default());
        assert_eq!(captured.count("chardb_db::sql"), 0);
    }

    #[test]
    fn test_init_memory_pool() {
        let pool = init_memory_pool().unwrap();
        assert_eq!(pool.max_size(), 4);
    }

    #[test]
    fn test_get_conn() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_migrations_run_on_init() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='characters'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_memory_pools_are_isolated() {
        let first = init_memory_pool().unwrap();
        let second = init_memory_pool().unwrap();

        get_conn(&first)
            .unwrap()
            .execute_batch("INSERT INTO classes (name, created_at, updated_at) VALUES ('Bard', 'x', 'x')")
            .unwrap();

        let count: i64 = get_conn(&second)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM classes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_initialize_file_pool() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chars.db");
        let pool = initialize(path.to_str().unwrap()).unwrap();
        assert!(path.exists());

        let conn = get_conn(&pool).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
    }

    #[test]
    fn test_initialize_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chars.db");
        let location = path.to_str().unwrap();

        let pool = initialize(location).unwrap();
        let version = migrations::current_version(&get_conn(&pool).unwrap()).unwrap();
        drop(pool);

        let pool = initialize(location).unwrap();
        let again = migrations::current_version(&get_conn(&pool).unwrap()).unwrap();
        assert_eq!(version, again);
    }

    #[test]
    fn test_open_with_diagnostics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chars.db");
        let location = path.to_str().unwrap();
        initialize(location).unwrap();

        let diagnostics = DiagnosticsConfig {
            log_statements: true,
            busy_timeout_ms: 250,
            max_connections: 2,
        };
        let pool = open(location, diagnostics).unwrap();
        assert_eq!(pool.max_size(), 2);

        let conn = get_conn(&pool).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM characters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 250);
    }

    #[test]
    fn test_unreachable_location_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("nested").join("chars.db");

        let result = initialize(path.to_str().unwrap());
        assert!(matches!(result, Err(Error::Connection(_))));

        let result = open("", DiagnosticsConfig::default());
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn test_zero_connections_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chars.db");
        let diagnostics = DiagnosticsConfig {
            max_connections: 0,
            ..DiagnosticsConfig::default()
        };

        let result = open(path.to_str().unwrap(), diagnostics);
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn test_diagnostics_deserialize_defaults() {
        let config: DiagnosticsConfig = serde_json::from_str(r#"{"log_statements": true}"#).unwrap();
        assert!(config.log_statements);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.max_connections, 4);
    }
}

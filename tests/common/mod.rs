//! Shared test harness for integration tests.
//!
//! Provides [`TestDb`], a file-backed database in a temporary directory
//! that is migrated on creation and removed when dropped.

use std::path::PathBuf;

use chardb_db::pool::{get_conn, initialize, DbPool, PooledConnection};
use tempfile::TempDir;

pub struct TestDb {
    pub pool: DbPool,
    pub path: PathBuf,
    _dir: TempDir,
}

#[allow(dead_code)]
impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("chardb.db");
        let pool = initialize(path.to_str().expect("temp path is not UTF-8"))
            .expect("failed to initialize database");
        Self {
            pool,
            path,
            _dir: dir,
        }
    }

    pub fn location(&self) -> &str {
        self.path.to_str().expect("temp path is not UTF-8")
    }

    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.pool).expect("failed to get connection")
    }

    /// Count rows straight from the table, soft-deleted ones included.
    pub fn raw_count(&self, table: &str) -> i64 {
        self.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .expect("failed to count rows")
    }
}

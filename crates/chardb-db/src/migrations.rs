//! Additive schema migrations.
//!
//! The runner compares the tables declared in a [`SchemaRegistry`] with
//! what exists on disk and applies the missing pieces: new tables, new
//! columns, new indexes. Existing columns are never dropped or altered.
//! Each applied change is recorded in a `schema_migrations` table.

use std::collections::HashSet;

use chardb_common::{Error, Result};
use rusqlite::Connection;

use crate::schema::{Column, Index, SchemaRegistry, TableSchema};

/// A single additive change to the on-disk schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaChange {
    CreateTable { table: TableSchema },
    AddColumn { table: &'static str, column: Column },
    CreateIndex { table: &'static str, index: Index },
}

impl SchemaChange {
    pub fn sql(&self) -> String {
        match self {
            Self::CreateTable { table } => table.create_table_sql(),
            Self::AddColumn { table, column } => {
                format!("ALTER TABLE {} ADD COLUMN {}", table, column.definition())
            }
            Self::CreateIndex { table, index } => index.create_sql(table),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::CreateTable { table } => format!("create table {}", table.name),
            Self::AddColumn { table, column } => format!("add column {}.{}", table, column.name),
            Self::CreateIndex { table, index } => {
                format!("create index {} on {}", index.name, table)
            }
        }
    }
}

/// Counts of the changes applied by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub tables_created: usize,
    pub columns_added: usize,
    pub indexes_created: usize,
}

impl MigrationReport {
    fn record(&mut self, change: &SchemaChange) {
        match change {
            SchemaChange::CreateTable { .. } => self.tables_created += 1,
            SchemaChange::AddColumn { .. } => self.columns_added += 1,
            SchemaChange::CreateIndex { .. } => self.indexes_created += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tables_created + self.columns_added + self.indexes_created
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Initialize the migrations table if it doesn't exist
fn init_migrations_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY NOT NULL,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> rusqlite::Result<usize> {
    conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
        row.get::<_, Option<usize>>(0)
    })
    .map(|version| version.unwrap_or(0))
}

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
}

fn index_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
}

fn existing_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(columns)
}

fn db_error(e: rusqlite::Error) -> Error {
    Error::migration(e.to_string())
}

/// Compute the changes needed to bring the database up to the registry.
///
/// Nothing is written. Fails when the registry is inconsistent or when a
/// missing column cannot be added to an existing table (`NOT NULL` without
/// a default).
pub fn plan_migrations(conn: &Connection, registry: &SchemaRegistry) -> Result<Vec<SchemaChange>> {
    registry
        .validate()
        .map_err(|e| Error::migration(format!("Invalid schema registry: {e}")))?;

    let mut changes = Vec::new();
    for table in registry.tables() {
        if !table_exists(conn, table.name).map_err(db_error)? {
            changes.push(SchemaChange::CreateTable {
                table: table.clone(),
            });
            changes.extend(table.all_indexes().into_iter().map(|index| {
                SchemaChange::CreateIndex {
                    table: table.name,
                    index,
                }
            }));
            continue;
        }

        let present = existing_columns(conn, table.name).map_err(db_error)?;
        for column in table.all_columns() {
            if present.contains(column.name) {
                continue;
            }
            if !column.can_be_added() {
                return Err(Error::migration(format!(
                    "Cannot add column {}.{}: NOT NULL without a default",
                    table.name, column.name
                )));
            }
            changes.push(SchemaChange::AddColumn {
                table: table.name,
                column,
            });
        }

        for index in table.all_indexes() {
            if !index_exists(conn, &index.name).map_err(db_error)? {
                changes.push(SchemaChange::CreateIndex {
                    table: table.name,
                    index,
                });
            }
        }
    }

    Ok(changes)
}

/// Bring the database up to the registry.
///
/// This function will:
/// 1. Enable foreign key constraints
/// 2. Create the migrations table if it doesn't exist
/// 3. Plan the additive changes
/// 4. Apply them all in one transaction, recording each one
///
/// Running it again against an unchanged registry applies nothing.
pub fn run_migrations(conn: &Connection, registry: &SchemaRegistry) -> Result<MigrationReport> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(db_error)?;
    init_migrations_table(conn).map_err(db_error)?;

    let changes = plan_migrations(conn, registry)?;
    let mut report = MigrationReport::default();
    if changes.is_empty() {
        tracing::debug!("Schema is up to date");
        return Ok(report);
    }

    let tx = conn.unchecked_transaction().map_err(db_error)?;
    let mut version = get_current_version(&tx).map_err(db_error)?;

    for change in &changes {
        let description = change.description();
        tx.execute_batch(&change.sql())
            .map_err(|e| Error::migration(format!("Failed to {description}: {e}")))?;

        version += 1;
        tx.execute(
            "INSERT INTO schema_migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![version, description],
        )
        .map_err(|e| Error::migration(format!("Failed to record {description}: {e}")))?;

        report.record(change);
        tracing::info!("Applied schema change {}: {}", version, description);
    }

    tx.commit().map_err(db_error)?;
    Ok(report)
}

/// Number of schema changes applied so far.
pub fn current_version(conn: &Connection) -> Result<usize> {
    init_migrations_table(conn).map_err(db_error)?;
    get_current_version(conn).map_err(db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DefaultValue;

    fn guilds() -> TableSchema {
        TableSchema::new("guilds")
            .column(Column::text("name").not_null().unique())
            .column(Column::integer("rank").not_null().default(DefaultValue::Integer(1)))
    }

    fn registry_with(table: TableSchema) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(table).unwrap();
        registry
    }

    #[test]
    fn test_run_migrations() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = SchemaRegistry::standard();

        // First run should create every table
        let report = run_migrations(&conn, &registry).unwrap();
        assert_eq!(report.tables_created, registry.len());
        assert_eq!(report.columns_added, 0);
        assert!(report.indexes_created > 0);
        assert_eq!(current_version(&conn).unwrap(), report.total());

        // Second run should not apply anything
        let report = run_migrations(&conn, &registry).unwrap();
        assert!(report.is_empty());
        assert!(plan_migrations(&conn, &registry).unwrap().is_empty());
    }

    #[test]
    fn test_schema_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &SchemaRegistry::standard()).unwrap();

        let tables = vec![
            "classes",
            "abilities",
            "characters",
            "stats",
            "currencies",
            "equipment",
            "items",
            "schema_migrations",
        ];

        for table in tables {
            assert!(table_exists(&conn, table).unwrap(), "Table {} should exist", table);
        }
        assert!(index_exists(&conn, "uq_currencies_code").unwrap());
        assert!(index_exists(&conn, "uq_stats_character_id").unwrap());
        assert!(index_exists(&conn, "idx_items_item_type").unwrap());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &SchemaRegistry::standard()).unwrap();

        let enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_adds_missing_columns_and_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE guilds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                name TEXT NOT NULL
            );
            INSERT INTO guilds (created_at, updated_at, name)
            VALUES ('2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00', 'Old Guard');",
        )
        .unwrap();

        let registry = registry_with(guilds());
        let plan = plan_migrations(&conn, &registry).unwrap();
        let descriptions: Vec<_> = plan.iter().map(SchemaChange::description).collect();
        assert_eq!(
            descriptions,
            [
                "add column guilds.deleted_at",
                "add column guilds.rank",
                "create index uq_guilds_name on guilds",
            ]
        );

        let report = run_migrations(&conn, &registry).unwrap();
        assert_eq!(report.columns_added, 2);
        assert_eq!(report.indexes_created, 1);

        // Existing rows pick up the column default
        let rank: i64 = conn
            .query_row("SELECT rank FROM guilds WHERE name = 'Old Guard'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(rank, 1);

        assert!(run_migrations(&conn, &registry).unwrap().is_empty());
    }

    #[test]
    fn test_never_drops_columns() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &registry_with(guilds())).unwrap();
        conn.execute_batch("ALTER TABLE guilds ADD COLUMN legacy_motto TEXT")
            .unwrap();

        let report = run_migrations(&conn, &registry_with(guilds())).unwrap();
        assert!(report.is_empty());
        assert!(existing_columns(&conn, "guilds")
            .unwrap()
            .contains("legacy_motto"));
    }

    #[test]
    fn test_not_null_without_default_is_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, &registry_with(guilds())).unwrap();
        let before = current_version(&conn).unwrap();

        let widened = guilds().column(Column::text("charter").not_null());
        let result = run_migrations(&conn, &registry_with(widened));
        assert!(matches!(result, Err(Error::Migration(_))));
        assert_eq!(current_version(&conn).unwrap(), before);
    }

    #[test]
    fn test_invalid_registry_is_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        let orphan = TableSchema::new("pets").column(Column::integer("owner_id").references("owners"));

        let result = run_migrations(&conn, &registry_with(orphan));
        assert!(matches!(result, Err(Error::Migration(_))));
        assert!(!table_exists(&conn, "pets").unwrap());
    }

    #[test]
    fn test_change_sql() {
        let change = SchemaChange::AddColumn {
            table: "guilds",
            column: Column::integer("rank").not_null().default(DefaultValue::Integer(1)),
        };
        assert_eq!(
            change.sql(),
            "ALTER TABLE guilds ADD COLUMN rank INTEGER NOT NULL DEFAULT 1"
        );
    }
}

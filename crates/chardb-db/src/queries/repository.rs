//! Generic create / read / update / soft-delete operations.
//!
//! Every operation takes the connection explicitly. Writes that touch more
//! than one row run inside a single transaction, so a failure leaves the
//! database exactly as it was.

use chardb_common::{Error, Result};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, ToSql};

use super::{read_error, read_timestamps, write_error, Entity};

/// Persist an entity and its owned sub-entities.
///
/// An entity without an id is inserted and receives a fresh one. An entity
/// that already carries an id is upserted on that id, so re-submitting a
/// fetched entity updates the row instead of duplicating it.
///
/// # Returns
///
/// * `Ok(E)` - The entity as persisted, with ids and timestamps populated
/// * `Err(Error::Persistence)` - If a constraint is violated or the engine fails
/// * `Err(Error::NotFound)` - If the id belongs to a soft-deleted row
pub fn create<E: Entity>(conn: &Connection, mut entity: E) -> Result<E> {
    let tx = conn.unchecked_transaction().map_err(write_error)?;
    save(&tx, &mut entity)?;
    tx.commit().map_err(write_error)?;
    Ok(entity)
}

/// Persist a batch of entities atomically.
///
/// Either every entity is written or none is. An empty batch is a no-op.
pub fn create_bulk<E: Entity>(conn: &Connection, entities: Vec<E>) -> Result<Vec<E>> {
    if entities.is_empty() {
        return Ok(entities);
    }

    let tx = conn.unchecked_transaction().map_err(write_error)?;
    let mut saved = Vec::with_capacity(entities.len());
    for mut entity in entities {
        save(&tx, &mut entity)?;
        saved.push(entity);
    }
    tx.commit().map_err(write_error)?;

    tracing::debug!(table = E::TABLE, count = saved.len(), "Bulk insert committed");
    Ok(saved)
}

/// Update an already persisted entity.
///
/// Same as [`create`] but refuses entities that were never saved.
pub fn update<E: Entity>(conn: &Connection, entity: E) -> Result<E> {
    if entity.id().is_none() {
        return Err(Error::invalid_input(format!(
            "Cannot update a {} that has no id",
            E::NAME
        )));
    }
    create(conn, entity)
}

/// Fetch a non-deleted entity with its owned sub-entities.
pub fn fetch_by_id<E: Entity>(conn: &Connection, id: E::Id) -> Result<E> {
    let sql = format!(
        "SELECT * FROM {} WHERE id = ?1 AND deleted_at IS NULL",
        E::TABLE
    );
    let raw_id: i64 = id.into();
    let entity = conn
        .query_row(&sql, [raw_id], read_row::<E>)
        .optional()
        .map_err(read_error)?;

    let mut entity = entity.ok_or_else(|| Error::not_found(format!("{} {}", E::NAME, id)))?;
    entity.load_children(conn)?;
    Ok(entity)
}

/// Fetch all non-deleted entities whose `column` equals `value`, ordered by id.
///
/// `column` must be a column of the entity's table.
pub fn fetch_where<E: Entity>(conn: &Connection, column: &str, value: &dyn ToSql) -> Result<Vec<E>> {
    if !E::schema().has_column(column) {
        return Err(Error::invalid_input(format!(
            "Table {} has no column '{}'",
            E::TABLE,
            column
        )));
    }

    let sql = format!(
        "SELECT * FROM {} WHERE {} = ?1 AND deleted_at IS NULL ORDER BY id",
        E::TABLE,
        column
    );
    query_all(conn, &sql, &[value])
}

/// Fetch the first non-deleted entity whose `column` equals `value`.
pub fn find_one_where<E: Entity>(conn: &Connection, column: &str, value: &dyn ToSql) -> Result<Option<E>> {
    Ok(fetch_where(conn, column, value)?.into_iter().next())
}

/// List all non-deleted entities, ordered by id.
pub fn list<E: Entity>(conn: &Connection) -> Result<Vec<E>> {
    let sql = format!(
        "SELECT * FROM {} WHERE deleted_at IS NULL ORDER BY id",
        E::TABLE
    );
    query_all(conn, &sql, &[])
}

/// Count non-deleted rows.
pub fn count<E: Entity>(conn: &Connection) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL", E::TABLE);
    conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(read_error)
}

/// Mark a row as deleted without removing it.
///
/// Owned sub-entities are left untouched; they are only reachable through
/// their parent.
pub fn soft_delete<E: Entity>(conn: &Connection, id: E::Id) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        E::TABLE
    );
    let raw_id: i64 = id.into();
    let rows_affected = conn
        .execute(&sql, rusqlite::params![Utc::now().to_rfc3339(), raw_id])
        .map_err(write_error)?;

    if rows_affected == 0 {
        return Err(Error::not_found(format!("{} {}", E::NAME, id)));
    }

    tracing::debug!(table = E::TABLE, id = %id, "Soft-deleted row");
    Ok(())
}

/// Write one entity and its children on an open connection or transaction.
pub(crate) fn save<E: Entity>(conn: &Connection, entity: &mut E) -> Result<()> {
    entity.validate()?;

    let schema = E::schema();
    let fields = schema.field_names();
    let mut values = entity.values()?;
    if values.len() != fields.len() {
        return Err(Error::internal(format!(
            "{} produced {} values for {} columns",
            E::NAME,
            values.len(),
            fields.len()
        )));
    }

    let now = Utc::now();
    let stamp = Value::Text(now.to_rfc3339());

    match entity.id() {
        None => {
            let mut columns = fields.clone();
            columns.extend(["created_at", "updated_at"]);
            values.push(stamp.clone());
            values.push(stamp);

            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                E::TABLE,
                columns.join(", "),
                placeholders(columns.len())
            );
            conn.execute(&sql, rusqlite::params_from_iter(values.iter()))
                .map_err(write_error)?;

            let id = E::Id::from(conn.last_insert_rowid());
            entity.set_id(id);
            let timestamps = entity.timestamps_mut();
            timestamps.created_at = Some(now);
            timestamps.updated_at = Some(now);
            timestamps.deleted_at = None;

            tracing::debug!(table = E::TABLE, id = %id, "Inserted row");
        }
        Some(id) => {
            let raw_id: i64 = id.into();
            let mut columns = vec!["id"];
            columns.extend(fields.iter().copied());
            columns.extend(["created_at", "updated_at"]);

            let mut params = Vec::with_capacity(columns.len());
            params.push(Value::Integer(raw_id));
            params.append(&mut values);
            params.push(stamp.clone());
            params.push(stamp);

            let assignments = fields
                .iter()
                .chain(std::iter::once(&"updated_at"))
                .map(|f| format!("{f} = excluded.{f}"))
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!(
                "INSERT INTO {table} ({}) VALUES ({})
                 ON CONFLICT(id) DO UPDATE SET {assignments}
                 WHERE {table}.deleted_at IS NULL",
                columns.join(", "),
                placeholders(columns.len()),
                table = E::TABLE,
            );
            let rows_affected = conn
                .execute(&sql, rusqlite::params_from_iter(params.iter()))
                .map_err(write_error)?;

            if rows_affected == 0 {
                return Err(Error::not_found(format!("{} {}", E::NAME, id)));
            }

            let created_at: String = conn
                .query_row(
                    &format!("SELECT created_at FROM {} WHERE id = ?1", E::TABLE),
                    [raw_id],
                    |row| row.get(0),
                )
                .map_err(read_error)?;
            let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| Error::internal(format!("Invalid created_at on {} {}: {e}", E::NAME, id)))?
                .with_timezone(&Utc);

            let timestamps = entity.timestamps_mut();
            timestamps.created_at = Some(created_at);
            timestamps.updated_at = Some(now);
            timestamps.deleted_at = None;

            tracing::debug!(table = E::TABLE, id = %id, "Upserted row");
        }
    }

    entity.save_children(conn)
}

/// Reclaim the row an owner holds through a unique `column`.
///
/// Soft-deleted rows count: the unique index still covers them, so a new
/// row could never be inserted. Such a row has `deleted_at` cleared and is
/// then overwritten by the caller's upsert. Returns `None` when the owner
/// has never had a row.
pub(crate) fn revive_owned<E: Entity>(conn: &Connection, column: &str, owner: i64) -> Result<Option<E::Id>> {
    let sql = format!(
        "SELECT id, deleted_at IS NOT NULL FROM {} WHERE {} = ?1",
        E::TABLE,
        column
    );
    let found = conn
        .query_row(&sql, [owner], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, bool>(1)?))
        })
        .optional()
        .map_err(read_error)?;

    let Some((raw_id, deleted)) = found else {
        return Ok(None);
    };
    if deleted {
        let sql = format!("UPDATE {} SET deleted_at = NULL WHERE id = ?1", E::TABLE);
        conn.execute(&sql, [raw_id]).map_err(write_error)?;
        tracing::debug!(table = E::TABLE, id = raw_id, "Revived soft-deleted row");
    }
    Ok(Some(E::Id::from(raw_id)))
}

fn read_row<E: Entity>(row: &rusqlite::Row<'_>) -> rusqlite::Result<E> {
    let mut entity = E::from_row(row)?;
    entity.set_id(E::Id::from(row.get::<_, i64>("id")?));
    *entity.timestamps_mut() = read_timestamps(row)?;
    Ok(entity)
}

fn query_all<E: Entity>(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<E>> {
    let mut stmt = conn.prepare(sql).map_err(read_error)?;
    let mut entities = stmt
        .query_map(params, read_row::<E>)
        .map_err(read_error)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(read_error)?;

    for entity in &mut entities {
        entity.load_children(conn)?;
    }
    Ok(entities)
}

fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

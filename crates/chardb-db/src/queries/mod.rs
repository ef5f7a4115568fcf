//! Entity persistence.
//!
//! [`Entity`] describes how a model maps onto its table; the generic
//! operations in [`repository`] work for every type implementing it.
//! The per-entity modules hold those implementations plus lookups that
//! only make sense for one table:
//!
//! - characters: Character and its owned sub-entities
//! - stats: per-character base attributes
//! - classes / abilities: class definitions
//! - currencies: per-character balances
//! - items / equipment: inventory and equipped items

pub mod abilities;
pub mod characters;
pub mod classes;
pub mod currencies;
pub mod equipment;
pub mod items;
pub mod repository;
pub mod stats;

use std::fmt;
use std::str::FromStr;

use chardb_common::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row};

use crate::models::Timestamps;
use crate::schema::TableSchema;

/// Mapping between a model and its table.
pub trait Entity: Sized {
    /// Typed identifier of the table's rows.
    type Id: Copy + From<i64> + Into<i64> + fmt::Display;

    const TABLE: &'static str;

    /// Human-readable name used in error messages.
    const NAME: &'static str;

    fn schema() -> TableSchema;

    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    fn timestamps(&self) -> &Timestamps;

    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// Field values in the order of `schema().field_names()`.
    fn values(&self) -> Result<Vec<Value>>;

    /// Build the model from a row selected with `SELECT *`.
    ///
    /// Identifier and timestamps are filled in by the repository.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Reject the entity before anything is written.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Persist owned sub-entities once the row itself has an id.
    fn save_children(&mut self, _conn: &Connection) -> Result<()> {
        Ok(())
    }

    /// Populate owned sub-entities after the row has been read.
    fn load_children(&mut self, _conn: &Connection) -> Result<()> {
        Ok(())
    }
}

/// Map an engine error raised while writing.
pub(crate) fn write_error(e: rusqlite::Error) -> Error {
    tracing::warn!("Write rejected: {}", e);
    Error::persistence(e.to_string())
}

/// Map an engine error raised while reading.
pub(crate) fn read_error(e: rusqlite::Error) -> Error {
    Error::persistence(e.to_string())
}

fn conversion_error<E>(row: &Row<'_>, column: &str, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    let index = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}

pub(crate) fn json_value(value: &serde_json::Value) -> Result<Value> {
    Ok(Value::Text(serde_json::to_string(value)?))
}

pub(crate) fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn optional_id<I: Into<i64>>(id: Option<I>) -> Value {
    id.map_or(Value::Null, |id| Value::Integer(id.into()))
}

pub(crate) fn read_json(row: &Row<'_>, column: &str) -> rusqlite::Result<serde_json::Value> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| conversion_error(row, column, e)),
        None => Ok(serde_json::Value::Null),
    }
}

pub(crate) fn read_parsed<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e: String| conversion_error(row, column, e))
}

pub(crate) fn read_optional_parsed<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| s.parse().map_err(|e: String| conversion_error(row, column, e)))
        .transpose()
}

pub(crate) fn read_optional_id<I: From<i64>>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<I>> {
    Ok(row.get::<_, Option<i64>>(column)?.map(I::from))
}

fn read_timestamp(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(row, column, e))
    })
    .transpose()
}

pub(crate) fn read_timestamps(row: &Row<'_>) -> rusqlite::Result<Timestamps> {
    Ok(Timestamps {
        created_at: read_timestamp(row, "created_at")?,
        updated_at: read_timestamp(row, "updated_at")?,
        deleted_at: read_timestamp(row, "deleted_at")?,
    })
}

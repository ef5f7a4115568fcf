//! Declarative table shapes.
//!
//! Every persisted entity describes its table as a [`TableSchema`]: the
//! field columns with their types, defaults and constraints, the indexes,
//! and the relationships to other tables. A [`SchemaRegistry`] collects
//! those shapes; nothing touches the database until the migration runner
//! consumes the registry.
//!
//! The standard columns `id`, `created_at`, `updated_at` and `deleted_at`
//! are implicit on every table and never declared by entities.

use chardb_common::{Error, Result};

use crate::models::{Ability, Character, Class, Currency, Equipment, Item, Stats};
use crate::queries::Entity;

/// Name of the surrogate key column present on every table.
pub const ID_COLUMN: &str = "id";

/// Backfill value for timestamp columns added to tables that already hold rows.
const EPOCH: &str = "1970-01-01T00:00:00+00:00";

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// Stored as `0`/`1` integers.
    Boolean,
    /// Serialized JSON document stored as text.
    Json,
    /// RFC 3339 timestamp stored as text.
    Timestamp,
}

impl ColumnType {
    /// SQLite type name used in DDL.
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Real => "REAL",
            Self::Text | Self::Json | Self::Timestamp => "TEXT",
        }
    }
}

/// Column default applied by the database.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Integer(i64),
    Real(f64),
    Text(&'static str),
    Boolean(bool),
    Json(&'static str),
}

impl DefaultValue {
    /// SQL literal for a `DEFAULT` clause.
    pub fn sql(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Real(v) => format!("{v:?}"),
            Self::Text(s) | Self::Json(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Boolean(true) => "1".to_string(),
            Self::Boolean(false) => "0".to_string(),
        }
    }
}

/// Target of a foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
}

/// A single declared column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub unique: bool,
    pub references: Option<ForeignKey>,
}

impl Column {
    /// A nullable column with no default and no constraints.
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: true,
            default: None,
            unique: false,
            references: None,
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn real(name: &'static str) -> Self {
        Self::new(name, ColumnType::Real)
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn json(name: &'static str) -> Self {
        Self::new(name, ColumnType::Json)
    }

    pub fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Enforced through a unique index so the column can also be added later.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Reference the `id` column of another table.
    #[must_use]
    pub fn references(mut self, table: &'static str) -> Self {
        self.references = Some(ForeignKey {
            table,
            column: ID_COLUMN,
        });
        self
    }

    /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`.
    pub fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type.sql());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.sql());
        }
        if let Some(fk) = &self.references {
            sql.push_str(&format!(" REFERENCES {}({})", fk.table, fk.column));
        }
        sql
    }

    /// Whether `ALTER TABLE ... ADD COLUMN` can add this column to a
    /// table that already holds rows.
    pub fn can_be_added(&self) -> bool {
        self.nullable || self.default.is_some()
    }
}

/// A secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<&'static str>,
    pub unique: bool,
}

impl Index {
    pub fn create_sql(&self, table: &str) -> String {
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            table,
            self.columns.join(", ")
        )
    }
}

/// Cardinality of a relationship, seen from the declaring table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// This table owns at most one row of the target; the key lives on the target.
    OneToOne,
    /// This table owns many rows of the target; the key lives on the target.
    OneToMany,
    /// This table points at one row of the target; the key lives here.
    ManyToOne,
}

/// A relationship between two registered tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: &'static str,
    pub foreign_key: &'static str,
}

/// The declared shape of one entity table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub relations: Vec<Relation>,
    pub checks: Vec<&'static str>,
}

impl TableSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            indexes: Vec::new(),
            relations: Vec::new(),
            checks: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn index(self, columns: &[&'static str]) -> Self {
        self.push_index(columns, false)
    }

    #[must_use]
    pub fn unique_index(self, columns: &[&'static str]) -> Self {
        self.push_index(columns, true)
    }

    fn push_index(mut self, columns: &[&'static str], unique: bool) -> Self {
        let prefix = if unique { "uq" } else { "idx" };
        self.indexes.push(Index {
            name: format!("{prefix}_{}_{}", self.name, columns.join("_")),
            columns: columns.to_vec(),
            unique,
        });
        self
    }

    #[must_use]
    pub fn relation(mut self, kind: RelationKind, target: &'static str, foreign_key: &'static str) -> Self {
        self.relations.push(Relation {
            kind,
            target,
            foreign_key,
        });
        self
    }

    /// Add a table-level `CHECK` constraint.
    #[must_use]
    pub fn check(mut self, expr: &'static str) -> Self {
        self.checks.push(expr);
        self
    }

    /// Names of the declared field columns, in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Declared columns plus the standard timestamp columns.
    ///
    /// `id` is excluded: it is created with the table and can never be added.
    pub fn all_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            Column::timestamp("created_at")
                .not_null()
                .default(DefaultValue::Text(EPOCH)),
            Column::timestamp("updated_at")
                .not_null()
                .default(DefaultValue::Text(EPOCH)),
            Column::timestamp("deleted_at"),
        ];
        columns.extend(self.columns.iter().cloned());
        columns
    }

    /// Declared indexes plus one unique index per unique column.
    pub fn all_indexes(&self) -> Vec<Index> {
        let mut indexes: Vec<Index> = self
            .columns
            .iter()
            .filter(|c| c.unique)
            .map(|c| Index {
                name: format!("uq_{}_{}", self.name, c.name),
                columns: vec![c.name],
                unique: true,
            })
            .collect();
        indexes.extend(self.indexes.iter().cloned());
        indexes
    }

    /// Whether `name` is a standard or declared column of this table.
    pub fn has_column(&self, name: &str) -> bool {
        name == ID_COLUMN || self.all_columns().iter().any(|c| c.name == name)
    }

    /// `CREATE TABLE` statement for this shape (indexes are separate).
    pub fn create_table_sql(&self) -> String {
        let mut parts = vec![format!("{ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT")];
        parts.extend(self.all_columns().iter().map(Column::definition));
        parts.extend(self.checks.iter().map(|expr| format!("CHECK ({expr})")));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            parts.join(",\n    ")
        )
    }
}

/// Ordered collection of table shapes consumed by the migration runner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    tables: Vec<TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every table of the character model.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for table in [
            Class::schema(),
            Ability::schema(),
            Character::schema(),
            Stats::schema(),
            Currency::schema(),
            Equipment::schema(),
            Item::schema(),
        ] {
            // Shapes are distinct by construction.
            registry.tables.push(table);
        }
        registry
    }

    /// Register a table shape.
    ///
    /// Registering an identical shape again is a no-op. Registering a
    /// different shape under an existing name is rejected.
    pub fn register(&mut self, table: TableSchema) -> Result<()> {
        match self.get(table.name) {
            Some(existing) if *existing == table => Ok(()),
            Some(_) => Err(Error::invalid_input(format!(
                "Table '{}' is already registered with a different shape",
                table.name
            ))),
            None => {
                self.tables.push(table);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Check that every relation and foreign key points at a registered
    /// table and that each relation's key column exists on the side that
    /// holds it.
    pub fn validate(&self) -> Result<()> {
        for table in &self.tables {
            for column in &table.columns {
                if let Some(fk) = &column.references {
                    if self.get(fk.table).is_none() {
                        return Err(Error::invalid_input(format!(
                            "Column {}.{} references unregistered table '{}'",
                            table.name, column.name, fk.table
                        )));
                    }
                }
            }

            for relation in &table.relations {
                let target = self.get(relation.target).ok_or_else(|| {
                    Error::invalid_input(format!(
                        "Table '{}' relates to unregistered table '{}'",
                        table.name, relation.target
                    ))
                })?;

                let holder = match relation.kind {
                    RelationKind::ManyToOne => table,
                    RelationKind::OneToOne | RelationKind::OneToMany => target,
                };
                if !holder.has_column(relation.foreign_key) {
                    return Err(Error::invalid_input(format!(
                        "Relation {} -> {} expects column {}.{}",
                        table.name, relation.target, holder.name, relation.foreign_key
                    )));
                }
            }
        }
        Ok(())
    }
}

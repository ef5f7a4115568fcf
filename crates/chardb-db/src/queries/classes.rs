//! Character class persistence.
//!
//! A class owns its abilities; saving a class writes them too.

use chardb_common::{ClassId, Error, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{json_value, read_json, repository, text_value, Entity};
use crate::models::{Ability, Class, Timestamps};
use crate::schema::{Column, DefaultValue, RelationKind, TableSchema};

impl Entity for Class {
    type Id = ClassId;

    const TABLE: &'static str = "classes";
    const NAME: &'static str = "class";

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .column(Column::text("name").not_null().unique())
            .column(Column::text("description").not_null().default(DefaultValue::Text("")))
            .column(Column::json("stats").default(DefaultValue::Json("{}")))
            .column(Column::json("equipment").default(DefaultValue::Json("[]")))
            .column(Column::json("attributes").default(DefaultValue::Json("{}")))
            .relation(RelationKind::OneToMany, "abilities", "class_id")
            .relation(RelationKind::OneToMany, "characters", "class_id")
    }

    fn id(&self) -> Option<ClassId> {
        self.id
    }

    fn set_id(&mut self, id: ClassId) {
        self.id = Some(id);
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            text_value(&self.name),
            text_value(&self.description),
            json_value(&self.stats)?,
            json_value(&self.equipment)?,
            json_value(&self.attributes)?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Class {
            name: row.get("name")?,
            description: row.get("description")?,
            stats: read_json(row, "stats")?,
            equipment: read_json(row, "equipment")?,
            attributes: read_json(row, "attributes")?,
            ..Class::default()
        })
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Class name must not be empty"));
        }
        Ok(())
    }

    fn save_children(&mut self, conn: &Connection) -> Result<()> {
        let id = self
            .id
            .ok_or_else(|| Error::internal("class abilities saved before the class"))?;

        for ability in &mut self.abilities {
            ability.class_id = Some(id);
            repository::save(conn, ability)?;
        }
        Ok(())
    }

    fn load_children(&mut self, conn: &Connection) -> Result<()> {
        if let Some(id) = self.id {
            self.abilities = repository::fetch_where::<Ability>(conn, "class_id", &id.get())?;
        }
        Ok(())
    }
}

/// Find a class by its unique name.
pub fn find_class_by_name(conn: &Connection, name: &str) -> Result<Option<Class>> {
    repository::find_one_where(conn, "name", &name)
}

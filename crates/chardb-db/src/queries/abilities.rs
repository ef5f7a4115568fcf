//! Ability persistence.

use chardb_common::{AbilityId, ClassId, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{optional_id, read_optional_id, repository, text_value, Entity};
use crate::models::{Ability, Timestamps};
use crate::schema::{Column, DefaultValue, RelationKind, TableSchema};

impl Entity for Ability {
    type Id = AbilityId;

    const TABLE: &'static str = "abilities";
    const NAME: &'static str = "ability";

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .column(Column::integer("class_id").references("classes"))
            .column(Column::text("name").not_null())
            .column(Column::text("description").not_null().default(DefaultValue::Text("")))
            .column(Column::integer("cost").not_null().default(DefaultValue::Integer(0)))
            .column(Column::integer("cooldown").not_null().default(DefaultValue::Integer(0)))
            .column(Column::text("effect").not_null().default(DefaultValue::Text("")))
            .index(&["class_id"])
            .relation(RelationKind::ManyToOne, "classes", "class_id")
    }

    fn id(&self) -> Option<AbilityId> {
        self.id
    }

    fn set_id(&mut self, id: AbilityId) {
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
            optional_id(self.class_id),
            text_value(&self.name),
            text_value(&self.description),
            Value::Integer(self.cost.into()),
            Value::Integer(self.cooldown.into()),
            text_value(&self.effect),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Ability {
            id: None,
            class_id: read_optional_id(row, "class_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            cost: row.get("cost")?,
            cooldown: row.get("cooldown")?,
            effect: row.get("effect")?,
            timestamps: Timestamps::default(),
        })
    }
}

/// List the abilities granted by a class.
pub fn list_abilities_for_class(conn: &Connection, class_id: ClassId) -> Result<Vec<Ability>> {
    repository::fetch_where(conn, "class_id", &class_id.get())
}

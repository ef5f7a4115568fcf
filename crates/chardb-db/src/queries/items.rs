//! Item persistence.
//!
//! An item is either carried (`character_id` set) or equipped
//! (`equipment_id` and `slot` set), never both. The table enforces this
//! with a `CHECK` constraint; [`Entity::validate`] reports it earlier with
//! a clearer message.

use chardb_common::{Error, ItemId, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{
    json_value, optional_id, read_json, read_optional_id, read_optional_parsed, repository,
    text_value, Entity,
};
use crate::models::{Item, Timestamps};
use crate::schema::{Column, DefaultValue, RelationKind, TableSchema};

impl Entity for Item {
    type Id = ItemId;

    const TABLE: &'static str = "items";
    const NAME: &'static str = "item";

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .column(Column::text("name").not_null())
            .column(Column::text("description").not_null().default(DefaultValue::Text("")))
            .column(Column::text("item_type").not_null())
            .column(Column::json("stats").default(DefaultValue::Json("{}")))
            .column(Column::real("value").not_null().default(DefaultValue::Real(0.0)))
            .column(Column::boolean("stackable").not_null().default(DefaultValue::Boolean(false)))
            .column(Column::integer("quantity").not_null().default(DefaultValue::Integer(1)))
            .column(Column::integer("character_id").references("characters"))
            .column(Column::integer("equipment_id").references("equipment"))
            .column(Column::text("slot"))
            .index(&["item_type"])
            .index(&["character_id"])
            .unique_index(&["equipment_id", "slot"])
            .check("character_id IS NULL OR equipment_id IS NULL")
            .relation(RelationKind::ManyToOne, "characters", "character_id")
            .relation(RelationKind::ManyToOne, "equipment", "equipment_id")
    }

    fn id(&self) -> Option<ItemId> {
        self.id
    }

    fn set_id(&mut self, id: ItemId) {
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
            text_value(&self.item_type),
            json_value(&self.stats)?,
            Value::Real(self.value),
            Value::Integer(self.stackable.into()),
            Value::Integer(self.quantity.into()),
            optional_id(self.character_id),
            optional_id(self.equipment_id),
            self.slot
                .map_or(Value::Null, |slot| Value::Text(slot.to_string())),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Item {
            id: None,
            name: row.get("name")?,
            description: row.get("description")?,
            item_type: row.get("item_type")?,
            stats: read_json(row, "stats")?,
            value: row.get("value")?,
            stackable: row.get("stackable")?,
            quantity: row.get("quantity")?,
            character_id: read_optional_id(row, "character_id")?,
            equipment_id: read_optional_id(row, "equipment_id")?,
            slot: read_optional_parsed(row, "slot")?,
            timestamps: Timestamps::default(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.character_id.is_some() && self.equipment_id.is_some() {
            return Err(Error::invalid_input(format!(
                "Item '{}' cannot be both in an inventory and equipped",
                self.name
            )));
        }
        if self.slot.is_some() != self.equipment_id.is_some() {
            return Err(Error::invalid_input(format!(
                "Item '{}' needs both an equipment record and a slot to be equipped",
                self.name
            )));
        }
        if self.item_type.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "Item '{}' needs a type",
                self.name
            )));
        }
        Ok(())
    }
}

/// List items of one type, wherever they are held.
pub fn list_items_by_type(conn: &Connection, item_type: &str) -> Result<Vec<Item>> {
    repository::fetch_where(conn, "item_type", &item_type)
}

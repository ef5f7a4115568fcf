//! Equipment persistence.
//!
//! An equipment record holds no columns of its own besides its owner;
//! each slot is an item row pointing back at the record.

use chardb_common::{CharacterId, EquipmentId, EquipmentSlot, Error, Result};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{optional_id, read_optional_id, repository, write_error, Entity};
use crate::models::{Equipment, Item, Timestamps};
use crate::schema::{Column, RelationKind, TableSchema};

impl Entity for Equipment {
    type Id = EquipmentId;

    const TABLE: &'static str = "equipment";
    const NAME: &'static str = "equipment";

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .column(Column::integer("character_id").unique().references("characters"))
            .relation(RelationKind::ManyToOne, "characters", "character_id")
            .relation(RelationKind::OneToMany, "items", "equipment_id")
    }

    fn id(&self) -> Option<EquipmentId> {
        self.id
    }

    fn set_id(&mut self, id: EquipmentId) {
        self.id = Some(id);
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn values(&self) -> Result<Vec<Value>> {
        Ok(vec![optional_id(self.character_id)])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Equipment {
            character_id: read_optional_id(row, "character_id")?,
            ..Equipment::default()
        })
    }

    fn save_children(&mut self, conn: &Connection) -> Result<()> {
        let id = self
            .id
            .ok_or_else(|| Error::internal("equipped items saved before their equipment"))?;

        // Release every slot; the loop below reassigns the ones still worn.
        let released = conn
            .execute(
                "UPDATE items SET equipment_id = NULL, slot = NULL, updated_at = ?2
                 WHERE equipment_id = ?1",
                rusqlite::params![id.get(), Utc::now().to_rfc3339()],
            )
            .map_err(write_error)?;
        tracing::trace!(equipment_id = %id, released, "Released equipment slots");

        for slot in EquipmentSlot::ALL {
            if let Some(item) = self.slot_mut(slot) {
                item.equipment_id = Some(id);
                item.slot = Some(slot);
                item.character_id = None;
                repository::save(conn, item)?;
            }
        }
        Ok(())
    }

    fn load_children(&mut self, conn: &Connection) -> Result<()> {
        let Some(id) = self.id else {
            return Ok(());
        };

        for item in repository::fetch_where::<Item>(conn, "equipment_id", &id.get())? {
            let slot = item.slot;
            match slot {
                Some(slot) => {
                    *self.slot_mut(slot) = Some(item);
                }
                None => tracing::warn!(
                    equipment_id = %id,
                    item = %item.name,
                    "Equipped item has no slot, skipping"
                ),
            }
        }
        Ok(())
    }
}

/// Get the equipment record of a character, if one has been written.
pub fn find_equipment_for_character(
    conn: &Connection,
    character_id: CharacterId,
) -> Result<Option<Equipment>> {
    repository::find_one_where(conn, "character_id", &character_id.get())
}

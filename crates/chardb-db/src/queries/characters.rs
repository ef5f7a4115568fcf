//! Character persistence.
//!
//! A character owns its stats, currency balances, inventory items and
//! equipment record. Saving a character writes all of them in the same
//! transaction; fetching one populates all of them.

use chardb_common::{CharacterId, ClassId, Error, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{
    equipment, json_value, optional_id, read_json, read_optional_id, read_parsed, repository,
    stats, text_value, Entity,
};
use crate::models::{Character, Currency, Equipment, Item, Stats, Timestamps};
use crate::schema::{Column, DefaultValue, RelationKind, TableSchema};

impl Entity for Character {
    type Id = CharacterId;

    const TABLE: &'static str = "characters";
    const NAME: &'static str = "character";

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .column(Column::text("name").not_null())
            .column(Column::integer("level").not_null().default(DefaultValue::Integer(1)))
            .column(Column::integer("experience").not_null().default(DefaultValue::Integer(0)))
            .column(Column::integer("class_id").references("classes"))
            .column(Column::text("status").not_null().default(DefaultValue::Text("active")))
            .column(Column::json("attributes").default(DefaultValue::Json("{}")))
            .index(&["class_id"])
            .relation(RelationKind::ManyToOne, "classes", "class_id")
            .relation(RelationKind::OneToOne, "stats", "character_id")
            .relation(RelationKind::OneToMany, "currencies", "character_id")
            .relation(RelationKind::OneToMany, "items", "character_id")
            .relation(RelationKind::OneToOne, "equipment", "character_id")
    }

    fn id(&self) -> Option<CharacterId> {
        self.id
    }

    fn set_id(&mut self, id: CharacterId) {
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
            Value::Integer(self.level.into()),
            Value::Integer(self.experience),
            optional_id(self.class_id),
            Value::Text(self.status.to_string()),
            json_value(&self.attributes)?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Character {
            name: row.get("name")?,
            level: row.get("level")?,
            experience: row.get("experience")?,
            class_id: read_optional_id(row, "class_id")?,
            status: read_parsed(row, "status")?,
            attributes: read_json(row, "attributes")?,
            ..Character::default()
        })
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Character name must not be empty"));
        }
        Ok(())
    }

    fn save_children(&mut self, conn: &Connection) -> Result<()> {
        let id = self
            .id
            .ok_or_else(|| Error::internal("character children saved before the character"))?;

        self.stats.character_id = Some(id);
        if self.stats.id.is_none() {
            self.stats.id = repository::revive_owned::<Stats>(conn, "character_id", id.get())?;
        }
        repository::save(conn, &mut self.stats)?;

        for currency in &mut self.currencies {
            currency.character_id = Some(id);
            repository::save(conn, currency)?;
        }

        for item in &mut self.inventory {
            item.character_id = Some(id);
            item.equipment_id = None;
            item.slot = None;
            repository::save(conn, item)?;
        }

        if let Some(equipment) = &mut self.equipment {
            equipment.character_id = Some(id);
            if equipment.id.is_none() {
                equipment.id =
                    repository::revive_owned::<Equipment>(conn, "character_id", id.get())?;
            }
            repository::save(conn, equipment)?;
        }

        Ok(())
    }

    fn load_children(&mut self, conn: &Connection) -> Result<()> {
        let Some(id) = self.id else {
            return Ok(());
        };

        // A soft-deleted stats row reads as defaults and is revived on the next save.
        self.stats = stats::find_stats_for_character(conn, id)?.unwrap_or_else(|| Stats {
            character_id: Some(id),
            ..Stats::default()
        });
        self.currencies = repository::fetch_where::<Currency>(conn, "character_id", &id.get())?;
        self.inventory = repository::fetch_where::<Item>(conn, "character_id", &id.get())?;
        self.equipment = equipment::find_equipment_for_character(conn, id)?;
        Ok(())
    }
}

/// Create a new level 1 character with default stats.
pub fn create_character(conn: &Connection, name: &str) -> Result<Character> {
    repository::create(conn, Character::new(name))
}

/// Get a character with all of its owned sub-entities.
pub fn get_character(conn: &Connection, id: CharacterId) -> Result<Character> {
    repository::fetch_by_id(conn, id)
}

/// List the characters of one class.
pub fn list_characters_by_class(conn: &Connection, class_id: ClassId) -> Result<Vec<Character>> {
    repository::fetch_where(conn, "class_id", &class_id.get())
}

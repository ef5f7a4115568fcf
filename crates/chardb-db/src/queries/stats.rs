//! Base attribute persistence.

use chardb_common::{CharacterId, Result, StatsId};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{optional_id, read_optional_id, repository, Entity};
use crate::models::{Stats, Timestamps};
use crate::schema::{Column, DefaultValue, RelationKind, TableSchema};

fn attribute(name: &'static str) -> Column {
    Column::integer(name)
        .not_null()
        .default(DefaultValue::Integer(10))
}

impl Entity for Stats {
    type Id = StatsId;

    const TABLE: &'static str = "stats";
    const NAME: &'static str = "stats";

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .column(Column::integer("character_id").unique().references("characters"))
            .column(attribute("strength"))
            .column(attribute("dexterity"))
            .column(attribute("constitution"))
            .column(attribute("intelligence"))
            .column(attribute("wisdom"))
            .column(attribute("charisma"))
            .relation(RelationKind::ManyToOne, "characters", "character_id")
    }

    fn id(&self) -> Option<StatsId> {
        self.id
    }

    fn set_id(&mut self, id: StatsId) {
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
            optional_id(self.character_id),
            Value::Integer(self.strength.into()),
            Value::Integer(self.dexterity.into()),
            Value::Integer(self.constitution.into()),
            Value::Integer(self.intelligence.into()),
            Value::Integer(self.wisdom.into()),
            Value::Integer(self.charisma.into()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Stats {
            id: None,
            character_id: read_optional_id(row, "character_id")?,
            strength: row.get("strength")?,
            dexterity: row.get("dexterity")?,
            constitution: row.get("constitution")?,
            intelligence: row.get("intelligence")?,
            wisdom: row.get("wisdom")?,
            charisma: row.get("charisma")?,
            timestamps: Timestamps::default(),
        })
    }
}

/// Get the stats row of a character, if one has been written.
pub fn find_stats_for_character(conn: &Connection, character_id: CharacterId) -> Result<Option<Stats>> {
    repository::find_one_where(conn, "character_id", &character_id.get())
}

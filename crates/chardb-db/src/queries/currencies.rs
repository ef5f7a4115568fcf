//! Currency balance persistence.

use chardb_common::{CharacterId, CurrencyId, Error, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

use super::{optional_id, read_optional_id, repository, text_value, Entity};
use crate::models::{Currency, Timestamps};
use crate::schema::{Column, DefaultValue, RelationKind, TableSchema};

impl Entity for Currency {
    type Id = CurrencyId;

    const TABLE: &'static str = "currencies";
    const NAME: &'static str = "currency";

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE)
            .column(Column::integer("character_id").references("characters"))
            .column(Column::text("name").not_null())
            .column(Column::text("code").not_null().unique())
            .column(Column::real("amount").not_null().default(DefaultValue::Real(0.0)))
            .column(Column::real("max_amount").not_null().default(DefaultValue::Real(999_999.0)))
            .column(Column::text("description").not_null().default(DefaultValue::Text("")))
            .index(&["character_id"])
            .relation(RelationKind::ManyToOne, "characters", "character_id")
    }

    fn id(&self) -> Option<CurrencyId> {
        self.id
    }

    fn set_id(&mut self, id: CurrencyId) {
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
            text_value(&self.name),
            text_value(&self.code),
            Value::Real(self.amount),
            Value::Real(self.max_amount),
            text_value(&self.description),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Currency {
            id: None,
            character_id: read_optional_id(row, "character_id")?,
            name: row.get("name")?,
            code: row.get("code")?,
            amount: row.get("amount")?,
            max_amount: row.get("max_amount")?,
            description: row.get("description")?,
            timestamps: Timestamps::default(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "Currency '{}' needs a code",
                self.name
            )));
        }
        Ok(())
    }
}

/// Find a currency by its globally unique code.
pub fn find_currency_by_code(conn: &Connection, code: &str) -> Result<Option<Currency>> {
    repository::find_one_where(conn, "code", &code)
}

/// List the balances held by a character.
pub fn list_currencies_for_character(
    conn: &Connection,
    character_id: CharacterId,
) -> Result<Vec<Currency>> {
    repository::fetch_where(conn, "character_id", &character_id.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_currency_defaults_persisted() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let gold = repository::create(&conn, Currency::new("Gold", "GLD")).unwrap();
        let fetched = repository::fetch_by_id::<Currency>(&conn, gold.id.unwrap()).unwrap();
        assert_eq!(fetched.amount, 0.0);
        assert_eq!(fetched.max_amount, 999_999.0);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        repository::create(&conn, Currency::new("Gold", "GLD")).unwrap();
        let result = repository::create(&conn, Currency::new("Other Gold", "GLD"));
        assert!(matches!(result, Err(Error::Persistence(_))));
    }

    #[test]
    fn test_missing_code_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let result = repository::create(&conn, Currency::new("Nameless", ""));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_find_currency_by_code() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let gems = repository::create(&conn, Currency::new("Gems", "GEM")).unwrap();
        let found = find_currency_by_code(&conn, "GEM").unwrap().unwrap();
        assert_eq!(found.id, gems.id);
        assert!(find_currency_by_code(&conn, "XXX").unwrap().is_none());
    }

    #[test]
    fn test_update_amount() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut gold = repository::create(&conn, Currency::new("Gold", "GLD")).unwrap();
        gold.amount = 150.25;
        repository::update(&conn, gold.clone()).unwrap();

        let fetched = find_currency_by_code(&conn, "GLD").unwrap().unwrap();
        assert_eq!(fetched.amount, 150.25);
        assert_eq!(repository::count::<Currency>(&conn).unwrap(), 1);
    }
}

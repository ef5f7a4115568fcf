//! Sample session against a character database.
//!
//! Creates a class, a fully equipped character and two bare ones, then
//! fetches the first character back and levels it up. Safe to run
//! repeatedly against the same database: the class is reused by name and
//! currency codes are derived from the owning character's id.

use chardb_common::{CharacterId, ClassId, EquipmentSlot, Error, Result};
use chardb_db::models::{Ability, Character, Class, Currency, Equipment, Item, Stats};
use chardb_db::pool::{get_conn, DbPool};
use chardb_db::queries::{classes, repository};
use serde_json::json;

const CLASS_NAME: &str = "Warrior";

/// Identifiers produced by one demo run.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    pub class_id: ClassId,
    pub character_id: CharacterId,
    pub bulk_ids: Vec<CharacterId>,
    pub updated_name: String,
    pub updated_level: i32,
}

fn persisted<T>(id: Option<T>, what: &str) -> Result<T> {
    id.ok_or_else(|| Error::internal(format!("{what} was saved without an id")))
}

fn warrior() -> Class {
    let mut class = Class::new(CLASS_NAME);
    class.description = "Front-line fighter".to_string();
    class.stats = json!({"strength": 2, "constitution": 1});
    class.equipment = json!(["Longsword", "Chain Mail"]);
    class.abilities = vec![
        Ability {
            cost: 10,
            cooldown: 3,
            effect: "Taunt nearby enemies".to_string(),
            ..Ability::new("Battle Cry")
        },
        Ability {
            cost: 0,
            cooldown: 1,
            effect: "Strike twice".to_string(),
            ..Ability::new("Cleave")
        },
    ];
    class
}

fn hero(class_id: ClassId) -> Character {
    let mut character = Character::new("Aria");
    character.class_id = Some(class_id);
    character.attributes = json!({"alignment": "lawful good"});
    character.stats = Stats {
        strength: 16,
        constitution: 14,
        ..Stats::default()
    };
    character.inventory = vec![
        Item {
            stackable: true,
            quantity: 3,
            value: 50.0,
            ..Item::new("Healing Potion", "consumable")
        },
        Item::new("Rope", "gear"),
    ];

    let mut equipment = Equipment::default();
    equipment.equip(
        EquipmentSlot::MainHand,
        Item {
            stats: json!({"damage": "1d8"}),
            value: 15.0,
            ..Item::new("Longsword", "weapon")
        },
    );
    equipment.equip(EquipmentSlot::Body, Item::new("Chain Mail", "armor"));
    character.equipment = Some(equipment);
    character
}

/// Run the sample session on a pool whose schema is already migrated.
pub fn run_demo(pool: &DbPool) -> Result<DemoReport> {
    let conn = get_conn(pool)?;

    let class = match classes::find_class_by_name(&conn, CLASS_NAME)? {
        Some(class) => class,
        None => repository::create(&conn, warrior())?,
    };
    let class_id = persisted(class.id, "class")?;
    tracing::info!(class_id = %class_id, "Class ready");

    let created = repository::create(&conn, hero(class_id))?;
    let character_id = persisted(created.id, "character")?;
    tracing::info!(character_id = %character_id, "Created character {}", created.name);

    let bulk = repository::create_bulk(
        &conn,
        vec![Character::new("bulk1"), Character::new("bulk2")],
    )?;
    let bulk_ids = bulk
        .iter()
        .map(|c| persisted(c.id, "bulk character"))
        .collect::<Result<Vec<_>>>()?;

    let mut character = repository::fetch_by_id::<Character>(&conn, character_id)?;
    character.name = format!("{} the Brave", character.name);
    character.level += 1;
    character.experience += 300;
    character.currencies.push(Currency {
        amount: 125.0,
        ..Currency::new("Gold", format!("GLD-{character_id}"))
    });
    let updated = repository::update(&conn, character)?;
    tracing::info!(character_id = %character_id, level = updated.level, "Updated character");

    Ok(DemoReport {
        class_id,
        character_id,
        bulk_ids,
        updated_name: updated.name,
        updated_level: updated.level,
    })
}

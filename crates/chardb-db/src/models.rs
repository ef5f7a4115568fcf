//! Rust models of the persisted entities.
//!
//! Every model carries an optional identifier (`None` until first saved)
//! and its [`Timestamps`]. `Default` values mirror the column defaults
//! declared in each table's schema.

use chardb_common::{
    AbilityId, CharacterId, CharacterStatus, ClassId, CurrencyId, EquipmentId, EquipmentSlot,
    ItemId, StatsId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Creation, update and soft-delete times of a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A player character together with everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: Option<CharacterId>,
    pub name: String,
    pub level: i32,
    pub experience: i64,
    pub class_id: Option<ClassId>,
    pub status: CharacterStatus,
    /// Freeform attributes.
    pub attributes: serde_json::Value,
    pub stats: Stats,
    pub currencies: Vec<Currency>,
    pub inventory: Vec<Item>,
    pub equipment: Option<Equipment>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Character {
    /// A level 1 character with default stats and nothing else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Character {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            level: 1,
            experience: 0,
            class_id: None,
            status: CharacterStatus::default(),
            attributes: json!({}),
            stats: Stats::default(),
            currencies: Vec::new(),
            inventory: Vec::new(),
            equipment: None,
            timestamps: Timestamps::default(),
        }
    }
}

/// The six base attributes of a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub id: Option<StatsId>,
    pub character_id: Option<CharacterId>,
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            id: None,
            character_id: None,
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
            timestamps: Timestamps::default(),
        }
    }
}

/// A character class and the abilities it grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: Option<ClassId>,
    pub name: String,
    pub description: String,
    /// Base stat modifiers.
    pub stats: serde_json::Value,
    /// Allowed equipment types.
    pub equipment: serde_json::Value,
    pub attributes: serde_json::Value,
    pub abilities: Vec<Ability>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Class {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            stats: json!({}),
            equipment: json!([]),
            attributes: json!({}),
            abilities: Vec::new(),
            timestamps: Timestamps::default(),
        }
    }
}

/// A special ability granted by a class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub id: Option<AbilityId>,
    pub class_id: Option<ClassId>,
    pub name: String,
    pub description: String,
    pub cost: i32,
    /// Cooldown in seconds.
    pub cooldown: i32,
    pub effect: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Ability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A balance of one currency held by a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: Option<CurrencyId>,
    pub character_id: Option<CharacterId>,
    pub name: String,
    /// Globally unique currency code.
    pub code: String,
    pub amount: f64,
    pub max_amount: f64,
    pub description: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Currency {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            ..Self::default()
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            id: None,
            character_id: None,
            name: String::new(),
            code: String::new(),
            amount: 0.0,
            max_amount: 999_999.0,
            description: String::new(),
            timestamps: Timestamps::default(),
        }
    }
}

/// An item, either carried in a character's inventory or equipped in a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<ItemId>,
    pub name: String,
    pub description: String,
    pub item_type: String,
    pub stats: serde_json::Value,
    pub value: f64,
    pub stackable: bool,
    pub quantity: i32,
    /// Set when the item sits in a character's inventory.
    pub character_id: Option<CharacterId>,
    /// Set when the item is equipped; never together with `character_id`.
    pub equipment_id: Option<EquipmentId>,
    pub slot: Option<EquipmentSlot>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Item {
    pub fn new(name: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_type: item_type.into(),
            ..Self::default()
        }
    }
}

impl Default for Item {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            item_type: String::new(),
            stats: json!({}),
            value: 0.0,
            stackable: false,
            quantity: 1,
            character_id: None,
            equipment_id: None,
            slot: None,
            timestamps: Timestamps::default(),
        }
    }
}

/// The items a character has equipped, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Option<EquipmentId>,
    pub character_id: Option<CharacterId>,
    pub head: Option<Item>,
    pub body: Option<Item>,
    pub legs: Option<Item>,
    pub feet: Option<Item>,
    pub main_hand: Option<Item>,
    pub off_hand: Option<Item>,
    pub necklace: Option<Item>,
    pub ring1: Option<Item>,
    pub ring2: Option<Item>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Equipment {
    pub fn slot(&self, slot: EquipmentSlot) -> Option<&Item> {
        match slot {
            EquipmentSlot::Head => self.head.as_ref(),
            EquipmentSlot::Body => self.body.as_ref(),
            EquipmentSlot::Legs => self.legs.as_ref(),
            EquipmentSlot::Feet => self.feet.as_ref(),
            EquipmentSlot::MainHand => self.main_hand.as_ref(),
            EquipmentSlot::OffHand => self.off_hand.as_ref(),
            EquipmentSlot::Necklace => self.necklace.as_ref(),
            EquipmentSlot::Ring1 => self.ring1.as_ref(),
            EquipmentSlot::Ring2 => self.ring2.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: EquipmentSlot) -> &mut Option<Item> {
        match slot {
            EquipmentSlot::Head => &mut self.head,
            EquipmentSlot::Body => &mut self.body,
            EquipmentSlot::Legs => &mut self.legs,
            EquipmentSlot::Feet => &mut self.feet,
            EquipmentSlot::MainHand => &mut self.main_hand,
            EquipmentSlot::OffHand => &mut self.off_hand,
            EquipmentSlot::Necklace => &mut self.necklace,
            EquipmentSlot::Ring1 => &mut self.ring1,
            EquipmentSlot::Ring2 => &mut self.ring2,
        }
    }

    /// Put `item` into `slot`, returning whatever was there before.
    pub fn equip(&mut self, slot: EquipmentSlot, item: Item) -> Option<Item> {
        self.slot_mut(slot).replace(item)
    }

    /// Number of occupied slots.
    pub fn equipped_count(&self) -> usize {
        EquipmentSlot::ALL
            .into_iter()
            .filter(|slot| self.slot(*slot).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_defaults() {
        let character = Character::new("Aria");
        assert_eq!(character.name, "Aria");
        assert_eq!(character.level, 1);
        assert_eq!(character.experience, 0);
        assert_eq!(character.status, CharacterStatus::Active);
        assert_eq!(character.attributes, json!({}));
        assert_eq!(character.stats.strength, 10);
        assert_eq!(character.stats.charisma, 10);
        assert!(character.id.is_none());
    }

    #[test]
    fn test_currency_and_item_defaults() {
        let gold = Currency::new("Gold", "GLD");
        assert_eq!(gold.amount, 0.0);
        assert_eq!(gold.max_amount, 999_999.0);

        let potion = Item::new("Potion", "consumable");
        assert_eq!(potion.quantity, 1);
        assert!(!potion.stackable);
        assert_eq!(potion.value, 0.0);
    }

    #[test]
    fn test_equip_replaces_slot() {
        let mut equipment = Equipment::default();
        assert!(equipment
            .equip(EquipmentSlot::MainHand, Item::new("Dagger", "weapon"))
            .is_none());

        let previous = equipment.equip(EquipmentSlot::MainHand, Item::new("Sword", "weapon"));
        assert_eq!(previous.unwrap().name, "Dagger");
        assert_eq!(
            equipment.slot(EquipmentSlot::MainHand).unwrap().name,
            "Sword"
        );
        assert_eq!(equipment.equipped_count(), 1);
    }

    #[test]
    fn test_character_serializes_flat_timestamps() {
        let value = serde_json::to_value(Character::new("Aria")).unwrap();
        assert_eq!(value["name"], "Aria");
        assert!(value.get("created_at").is_some());
        assert!(value.get("timestamps").is_none());
    }
}

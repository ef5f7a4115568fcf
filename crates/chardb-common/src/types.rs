//! Domain enums stored as text columns.
//!
//! All enums are serialized in snake_case and round-trip through their
//! `Display` / `FromStr` implementations, which is how they are written to
//! and read from the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterStatus {
    /// Playable character.
    #[default]
    Active,
    /// Parked by the player.
    Inactive,
    /// Dead and awaiting revival.
    Deceased,
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Deceased => write!(f, "deceased"),
        }
    }
}

impl FromStr for CharacterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "deceased" => Ok(Self::Deceased),
            _ => Err(format!("Invalid character status: {s}")),
        }
    }
}

/// Slot of an equipment record that can hold a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Head,
    Body,
    Legs,
    Feet,
    MainHand,
    OffHand,
    Necklace,
    Ring1,
    Ring2,
}

impl EquipmentSlot {
    /// Every slot, in display order.
    pub const ALL: [EquipmentSlot; 9] = [
        Self::Head,
        Self::Body,
        Self::Legs,
        Self::Feet,
        Self::MainHand,
        Self::OffHand,
        Self::Necklace,
        Self::Ring1,
        Self::Ring2,
    ];
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Head => "head",
            Self::Body => "body",
            Self::Legs => "legs",
            Self::Feet => "feet",
            Self::MainHand => "main_hand",
            Self::OffHand => "off_hand",
            Self::Necklace => "necklace",
            Self::Ring1 => "ring1",
            Self::Ring2 => "ring2",
        };
        f.write_str(s)
    }
}

impl FromStr for EquipmentSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.to_string() == s)
            .ok_or_else(|| format!("Invalid equipment slot: {s}"))
    }
}

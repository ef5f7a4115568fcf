//! Typed ID wrappers over SQLite row identifiers.
//!
//! Every entity table uses an `INTEGER PRIMARY KEY AUTOINCREMENT` surrogate
//! key. Wrapping it per entity prevents passing a `ClassId` where a
//! `CharacterId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Generate a newtype ID wrapper over `i64`.
///
/// The macro produces a struct with:
/// - `get()` returning the raw row id
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`,
///   `Serialize`, `Deserialize`
/// - `Display` and `FromStr` delegating to the inner integer
/// - `From<i64>` and `Into<i64>` conversions
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                /// Return the raw row id.
                #[must_use]
                pub fn get(&self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = ParseIntError;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    s.parse::<i64>().map(Self)
                }
            }

            impl From<i64> for $name {
                fn from(id: i64) -> Self {
                    Self(id)
                }
            }

            impl From<$name> for i64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Identifier of a character row.
    CharacterId,
    /// Identifier of a character's stats row.
    StatsId,
    /// Identifier of a character class.
    ClassId,
    /// Identifier of a class ability.
    AbilityId,
    /// Identifier of a currency balance.
    CurrencyId,
    /// Identifier of an item.
    ItemId,
    /// Identifier of a character's equipment record.
    EquipmentId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_conversions() {
        let id = CharacterId::from(42);
        assert_eq!(id.get(), 42);
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn test_id_display_and_parse() {
        let id = ItemId::from(1234);
        assert_eq!(id.to_string(), "1234");

        let parsed: ItemId = "1234".parse().unwrap();
        assert_eq!(parsed, id);

        assert!("not-a-number".parse::<ItemId>().is_err());
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = ClassId::from(9);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "9");

        let back: ClassId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ids_order() {
        assert!(CurrencyId::from(1) < CurrencyId::from(2));
    }
}

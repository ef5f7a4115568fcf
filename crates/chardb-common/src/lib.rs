//! chardb-common: shared types used across the chardb crates.
//!
//! - **Typed IDs**: integer newtypes so a `CharacterId` can never be passed
//!   where an `ItemId` is expected
//! - **Domain enums**: character status and equipment slots
//! - **Error handling**: the persistence error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use chardb_common::{CharacterId, EquipmentSlot, Error, Result};
//!
//! let id = CharacterId::from(7);
//! assert_eq!(id.get(), 7);
//! assert_eq!(EquipmentSlot::MainHand.to_string(), "main_hand");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("character 7"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;

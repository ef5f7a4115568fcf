//! chardb-db: schema registry, migrations, and entity persistence.
//!
//! This crate stores the character model in SQLite using rusqlite with
//! r2d2 connection pooling.
//!
//! # Modules
//!
//! - `schema` - Declarative table shapes and the registry that holds them
//! - `pool` - Connection pool management and statement diagnostics
//! - `migrations` - Additive schema convergence
//! - `models` - Rust models of the persisted entities
//! - `queries` - The generic entity repository and per-entity lookups
//!
//! # Example
//!
//! ```no_run
//! use chardb_db::models::Character;
//! use chardb_db::pool::{get_conn, initialize};
//! use chardb_db::queries::repository;
//!
//! let pool = initialize("/var/lib/chardb/chardb.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let hero = repository::create(&conn, Character::new("Aria")).unwrap();
//! println!("Created character #{}", hero.id.unwrap());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod schema;

pub use queries::Entity;
pub use schema::SchemaRegistry;

//! SQLite persistence for projected entities.
//!
//! - `migrations`: connection pool, pragmas and the idempotent schema
//! - `repo`: typed load/save per entity plus the read-side queries used by the API

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;

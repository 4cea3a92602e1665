pub mod catalog;
pub mod db;
pub mod kv;
pub mod repo;
pub mod schema;

pub use db::SqliteStore;
pub use kv::{KeyValueStore, MemoryStore};

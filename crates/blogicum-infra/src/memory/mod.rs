//! In-memory store - used when no database is configured and in tests.
//!
//! Implements every repository port over one set of tables behind an async
//! `RwLock`, applying the same cascade and visibility rules the database does.
//! Data is lost on process restart.

mod store;

pub use store::InMemoryStore;

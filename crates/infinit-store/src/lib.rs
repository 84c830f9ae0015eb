//! Storage layer for the infinit movement database
//!
//! Exposes the `Store` trait consumed by the resolution and deduplication
//! engine, and a SQLite-backed implementation. All multi-row mutations that
//! must be atomic (the per-group movement merge) run inside a single
//! transaction in the backend.

pub mod sqlite_store;
pub mod store;

pub use sqlite_store::SqliteStore;
pub use store::{MergeOutcome, Store, StoreError};

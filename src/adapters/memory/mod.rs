//! In-memory persistence adapter.
//!
//! Backs unit and flow tests, and local development without Postgres.

mod store;

pub use store::InMemoryStore;

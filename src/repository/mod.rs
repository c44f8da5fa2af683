mod database;
mod git_store;
pub mod indexer;

pub use database::{Database, ObjectRecord};
pub use git_store::{GitStore, Walk};
pub use indexer::Indexer;

// Re-export the schema version for callers who need it
pub const SCHEMA_VERSION: &str = "1";

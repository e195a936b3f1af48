//! Database module exports.

mod memory;
pub mod models;
mod mongo;
mod repository;
mod source;

pub use memory::MemorySource;
pub use models::*;
pub use mongo::Database;
pub use repository::Repository;
pub use source::{int_filter, MongoEntity, MongoSource, SourceStore};

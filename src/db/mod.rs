pub mod migrations;
pub mod repository;

pub use repository::{MemoryBackend, ProgressBackend, ProgressRepo, SqliteBackend};

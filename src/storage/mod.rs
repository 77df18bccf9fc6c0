pub mod database;
pub mod reference_store;
pub mod wiki_store;

pub use database::{Database, DatabaseStats, PoolConfig, SharedDatabase};
pub use reference_store::WantedPage;
pub use wiki_store::WikiStore;

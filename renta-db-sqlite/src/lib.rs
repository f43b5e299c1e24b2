//! SQLite storage for calculation history.

mod decimal;
pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteHistoryRepository;

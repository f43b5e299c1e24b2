pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use memory::{InMemoryHistoryRepository, InMemoryRepositoryFactory};
pub use repository::{HistoryRepository, RepositoryError};

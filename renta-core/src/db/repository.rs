use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewSavedCalculation, SavedCalculation};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for completed calculations. Owned by the caller; the calculator
/// never touches it.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Stores a calculation and returns it with its generated id and
    /// timestamp.
    async fn save(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError>;

    async fn get(&self, id: i64) -> Result<SavedCalculation, RepositoryError>;

    /// Newest first, optionally restricted to one fiscal year.
    async fn list(
        &self,
        fiscal_year: Option<i32>,
    ) -> Result<Vec<SavedCalculation>, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}

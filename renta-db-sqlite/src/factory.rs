use async_trait::async_trait;
use renta_core::db::{DbConfig, HistoryRepository, RepositoryError, RepositoryFactory};
use tracing::info;

use crate::repository::SqliteHistoryRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`renta_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use renta_core::db::RepositoryRegistry;
/// use renta_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    ///
    /// Accepted connection-string values:
    /// * A bare file path such as `"renta.db"`. The file is created if it
    ///   does not exist.
    /// * `":memory:"` for a throwaway database.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
        let repo = SqliteHistoryRepository::open(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(path = %config.connection_string, "sqlite history opened");
        Ok(Box::new(repo))
    }
}

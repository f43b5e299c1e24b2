use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{HistoryRepository, RepositoryError};

/// Where calculation history is kept.
///
/// `backend` names a registered [`RepositoryFactory`]; `connection_string`
/// is handed to it untouched.
///
/// | backend  | connection_string examples |
/// |----------|----------------------------|
/// | `sqlite` | `renta.db`, `:memory:`     |
/// | `memory` | ignored                    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Builds a [`HistoryRepository`] for one backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open the store described by `config`, running any setup it needs.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError>;
}

/// Backend factories keyed by name. Front ends register the backends they
/// link against at startup and pick one from configuration.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers `factory`, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// # Errors
    /// * [`RepositoryError::Configuration`] if `config.backend` is not
    ///   registered.
    /// * Whatever the selected factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{HistoryRepository, RepositoryError};
use crate::models::{NewSavedCalculation, SavedCalculation};

#[derive(Debug, Default)]
struct History {
    next_id: i64,
    // newest first
    records: Vec<SavedCalculation>,
}

/// Process-local history, lost on exit. Useful for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    history: Mutex<History>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, History>, RepositoryError> {
        self.history
            .lock()
            .map_err(|e| RepositoryError::Database(format!("history lock poisoned: {e}")))
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn save(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError> {
        let mut history = self.lock()?;
        history.next_id += 1;

        let saved = SavedCalculation {
            id: history.next_id,
            fiscal_year: calc.fiscal_year,
            created_at: Utc::now(),
            result: calc.result,
        };
        history.records.insert(0, saved.clone());

        debug!(id = saved.id, fiscal_year = saved.fiscal_year, "calculation saved");
        Ok(saved)
    }

    async fn get(&self, id: i64) -> Result<SavedCalculation, RepositoryError> {
        self.lock()?
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(
        &self,
        fiscal_year: Option<i32>,
    ) -> Result<Vec<SavedCalculation>, RepositoryError> {
        Ok(self
            .lock()?
            .records
            .iter()
            .filter(|record| fiscal_year.is_none_or(|year| record.fiscal_year == year))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let mut history = self.lock()?;
        let before = history.records.len();
        history.records.retain(|record| record.id != id);

        if history.records.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// [`RepositoryFactory`] for the `"memory"` backend. Every `create` call
/// returns a fresh, empty history.
pub struct InMemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for InMemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn HistoryRepository>, RepositoryError> {
        Ok(Box::new(InMemoryHistoryRepository::new()))
    }
}

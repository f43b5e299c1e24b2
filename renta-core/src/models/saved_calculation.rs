use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::TaxCalculationResult;
use crate::calculations::fiscal_year_for;

/// A calculation as kept in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCalculation {
    pub id: i64,
    pub fiscal_year: i32,
    pub created_at: DateTime<Utc>,
    pub result: TaxCalculationResult,
}

/// For saving new calculations (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSavedCalculation {
    pub fiscal_year: i32,
    pub result: TaxCalculationResult,
}

impl NewSavedCalculation {
    /// Tags `result` with the fiscal year that applies on `date`.
    pub fn for_date(
        result: TaxCalculationResult,
        date: NaiveDate,
    ) -> Self {
        Self {
            fiscal_year: fiscal_year_for(date),
            result,
        }
    }
}

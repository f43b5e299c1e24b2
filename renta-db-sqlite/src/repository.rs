use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use renta_core::{
    BalanceDirection, BracketApportionment, ExpenseBreakdown, HistoryRepository,
    NewSavedCalculation, RepositoryError, SavedCalculation, TaxCalculationResult,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal};

const MEMORY: &str = ":memory:";

const SELECT_COLUMNS: &str = "SELECT id, fiscal_year,
        annual_professional_fee_income, annual_payroll_income,
        professional_fee_deduction, fixed_deduction,
        lodging_and_restaurants, professional_services, rent, household_workers,
        expenses_raw_total, expenses_total,
        taxable_net_income, computed_tax, total_withholdings,
        balance, balance_direction, bracket_breakdown, created_at
    FROM tax_calculation";

pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    /// Open a database file, creating it if missing. `":memory:"` opens a
    /// private in-memory database on a single connection.
    pub async fn open(connection_string: &str) -> Result<Self> {
        let pool = if connection_string == MEMORY {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
        } else {
            let options = SqliteConnectOptions::new()
                .filename(connection_string)
                .create_if_missing(true);
            SqlitePoolOptions::new().connect_with(options).await
        }
        .with_context(|| format!("Failed to open database: {}", connection_string))?;

        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

// Fixed-width so that text order is chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|e| RepositoryError::Database(format!("Failed to parse datetime '{}': {}", s, e)))
}

fn row_to_saved_calculation(row: &SqliteRow) -> Result<SavedCalculation, RepositoryError> {
    let direction: String = row.try_get("balance_direction").map_err(db_error)?;
    let balance_direction = BalanceDirection::parse(&direction).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid balance direction: {}", direction))
    })?;

    let breakdown_json: String = row.try_get("bracket_breakdown").map_err(db_error)?;
    let bracket_breakdown: Vec<BracketApportionment> = serde_json::from_str(&breakdown_json)
        .map_err(|e| RepositoryError::Database(format!("Invalid bracket breakdown: {}", e)))?;

    Ok(SavedCalculation {
        id: row.try_get("id").map_err(db_error)?,
        fiscal_year: row.try_get("fiscal_year").map_err(db_error)?,
        created_at: parse_datetime(&row.try_get::<String, _>("created_at").map_err(db_error)?)?,
        result: TaxCalculationResult {
            annual_professional_fee_income: get_decimal(row, "annual_professional_fee_income")?,
            annual_payroll_income: get_decimal(row, "annual_payroll_income")?,
            professional_fee_deduction: get_decimal(row, "professional_fee_deduction")?,
            fixed_deduction: get_decimal(row, "fixed_deduction")?,
            deductible_expenses: ExpenseBreakdown {
                lodging_and_restaurants: get_decimal(row, "lodging_and_restaurants")?,
                professional_services: get_decimal(row, "professional_services")?,
                rent: get_decimal(row, "rent")?,
                household_workers: get_decimal(row, "household_workers")?,
                raw_total: get_decimal(row, "expenses_raw_total")?,
                total: get_decimal(row, "expenses_total")?,
            },
            taxable_net_income: get_decimal(row, "taxable_net_income")?,
            computed_tax: get_decimal(row, "computed_tax")?,
            total_withholdings: get_decimal(row, "total_withholdings")?,
            balance: get_decimal(row, "balance")?,
            balance_direction,
            bracket_breakdown,
        },
    })
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn save(
        &self,
        calc: NewSavedCalculation,
    ) -> Result<SavedCalculation, RepositoryError> {
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let result = &calc.result;
        let expenses = &result.deductible_expenses;
        let breakdown_json = serde_json::to_string(&result.bracket_breakdown).map_err(db_error)?;

        let inserted = sqlx::query(
            "INSERT INTO tax_calculation (
                fiscal_year,
                annual_professional_fee_income, annual_payroll_income,
                professional_fee_deduction, fixed_deduction,
                lodging_and_restaurants, professional_services, rent, household_workers,
                expenses_raw_total, expenses_total,
                taxable_net_income, computed_tax, total_withholdings,
                balance, balance_direction, bracket_breakdown, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(calc.fiscal_year)
        .bind(decimal_to_text(result.annual_professional_fee_income))
        .bind(decimal_to_text(result.annual_payroll_income))
        .bind(decimal_to_text(result.professional_fee_deduction))
        .bind(decimal_to_text(result.fixed_deduction))
        .bind(decimal_to_text(expenses.lodging_and_restaurants))
        .bind(decimal_to_text(expenses.professional_services))
        .bind(decimal_to_text(expenses.rent))
        .bind(decimal_to_text(expenses.household_workers))
        .bind(decimal_to_text(expenses.raw_total))
        .bind(decimal_to_text(expenses.total))
        .bind(decimal_to_text(result.taxable_net_income))
        .bind(decimal_to_text(result.computed_tax))
        .bind(decimal_to_text(result.total_withholdings))
        .bind(decimal_to_text(result.balance))
        .bind(result.balance_direction.as_str())
        .bind(breakdown_json)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = inserted.last_insert_rowid();
        debug!(id, fiscal_year = calc.fiscal_year, "calculation saved");
        self.get(id).await
    }

    async fn get(&self, id: i64) -> Result<SavedCalculation, RepositoryError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_saved_calculation(&row)
    }

    async fn list(
        &self,
        fiscal_year: Option<i32>,
    ) -> Result<Vec<SavedCalculation>, RepositoryError> {
        let rows = match fiscal_year {
            Some(year) => {
                sqlx::query(&format!(
                    "{} WHERE fiscal_year = ? ORDER BY created_at DESC, id DESC",
                    SELECT_COLUMNS
                ))
                .bind(year)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "{} ORDER BY created_at DESC, id DESC",
                    SELECT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error)?;

        rows.iter().map(row_to_saved_calculation).collect()
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tax_calculation WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

//! CSV loader for batch income declarations.
//!
//! ## CSV Format
//!
//! One declaration per row. Column order does **not** matter (headers are
//! matched by name). Header names are case-sensitive.
//!
//! | Column                         | Required | Type    | Notes                                   |
//! |--------------------------------|----------|---------|-----------------------------------------|
//! | `professional_fee_income`      | no       | decimal | 4th category; empty or absent means `0` |
//! | `professional_fee_period`      | no       | string  | `monthly` (default) or `annual`         |
//! | `payroll_income`               | no       | decimal | 5th category; empty or absent means `0` |
//! | `payroll_period`               | no       | string  | `monthly` (default) or `annual`         |
//! | `lodging_and_restaurants`      | no       | decimal | Annual amount                           |
//! | `professional_services`        | no       | decimal | Annual amount                           |
//! | `rent`                         | no       | decimal | Annual amount                           |
//! | `household_workers`            | no       | decimal | Annual amount                           |
//! | `professional_fee_withholding` | no       | decimal | Annual amount                           |
//! | `payroll_withholding`          | no       | decimal | Annual amount                           |
//!
//! Periods also accept the Spanish `mensual` / `anual`. Each row must carry
//! some income and no negative amounts.
//!
//! ### Example
//!
//! ```csv
//! professional_fee_income,professional_fee_period,payroll_income,payroll_period,rent,payroll_withholding
//! ,,5000,monthly,,3500
//! 10000,annual,,,3000,
//! ```
use std::path::Path;

use renta_core::{
    DeclarationError, DeductibleExpenses, IncomeDeclaration, IncomePeriod, Withholdings,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvRow {
    professional_fee_income: Option<Decimal>,
    professional_fee_period: Option<String>,
    payroll_income: Option<Decimal>,
    payroll_period: Option<String>,
    lodging_and_restaurants: Option<Decimal>,
    professional_services: Option<Decimal>,
    rent: Option<Decimal>,
    household_workers: Option<Decimal>,
    professional_fee_withholding: Option<Decimal>,
    payroll_withholding: Option<Decimal>,
}

/// Errors that can occur while loading or converting CSV data.
///
/// `row` is 1-based and counts data rows only (the header is row 0).
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    #[error("cannot read CSV file: {0}")]
    Io(#[from] std::io::Error),

    /// Bad structure, wrong column count or a cell of the wrong type.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("unrecognised income period '{period}' on row {row}")]
    InvalidPeriod { period: String, row: usize },

    #[error("invalid declaration on row {row}: {source}")]
    InvalidDeclaration {
        row: usize,
        source: DeclarationError,
    },
}

fn parse_period(
    cell: Option<String>,
    row_number: usize,
) -> Result<IncomePeriod, CsvLoadError> {
    match cell {
        None => Ok(IncomePeriod::default()),
        Some(period) => IncomePeriod::parse(&period).ok_or(CsvLoadError::InvalidPeriod {
            period,
            row: row_number,
        }),
    }
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<IncomeDeclaration, CsvLoadError> {
    let declaration = IncomeDeclaration {
        professional_fee_income: row.professional_fee_income.unwrap_or_default(),
        professional_fee_period: parse_period(row.professional_fee_period, row_number)?,
        payroll_income: row.payroll_income.unwrap_or_default(),
        payroll_period: parse_period(row.payroll_period, row_number)?,
        deductible_expenses: DeductibleExpenses {
            lodging_and_restaurants: row.lodging_and_restaurants.unwrap_or_default(),
            professional_services: row.professional_services.unwrap_or_default(),
            rent: row.rent.unwrap_or_default(),
            household_workers: row.household_workers.unwrap_or_default(),
        },
        withholdings: Withholdings {
            professional_fee: row.professional_fee_withholding.unwrap_or_default(),
            payroll: row.payroll_withholding.unwrap_or_default(),
        },
    };

    declaration
        .validate()
        .map_err(|source| CsvLoadError::InvalidDeclaration {
            row: row_number,
            source,
        })?;

    Ok(declaration)
}

/// Parse CSV text and return the declarations in file order.
///
/// # Errors
///
/// * [`CsvLoadError::Parse`] if the CSV is structurally invalid or a cell
///   cannot be deserialised.
/// * [`CsvLoadError::InvalidPeriod`] for an unknown period code.
/// * [`CsvLoadError::InvalidDeclaration`] for a row without income or with
///   a negative amount.
pub fn load_from_str(input: &str) -> Result<Vec<IncomeDeclaration>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<IncomeDeclaration>, CsvLoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

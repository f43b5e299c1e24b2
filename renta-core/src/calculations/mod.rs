//! Tax calculation logic.
//!
//! [`IncomeTaxCalculator`] turns an [`IncomeDeclaration`](crate::IncomeDeclaration)
//! into an itemized [`TaxCalculationResult`](crate::TaxCalculationResult).
//! [`fiscal_year_for`] decides which year a saved calculation is filed under.

pub mod common;
pub mod fiscal_year;
pub mod income_tax;

pub use fiscal_year::fiscal_year_for;
pub use income_tax::{IncomeTaxCalculator, IncomeTaxError};

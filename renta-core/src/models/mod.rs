mod declaration;
mod income_period;
mod rate_table;
mod saved_calculation;
mod tax_bracket;
mod tax_calculation;
mod tax_summary;
mod taxpayer;

pub use declaration::{DeclarationError, DeductibleExpenses, IncomeDeclaration, Withholdings};
pub use income_period::IncomePeriod;
pub use rate_table::{RateTable, RateTableError};
pub use saved_calculation::{NewSavedCalculation, SavedCalculation};
pub use tax_bracket::TaxBracket;
pub use tax_calculation::{
    BalanceDirection, BracketApportionment, ExpenseBreakdown, TaxCalculationResult,
};
pub use tax_summary::TaxSummary;
pub use taxpayer::{CredentialError, TaxpayerCredentials};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::IncomePeriod;

/// Reasons a declaration is refused before it reaches the calculator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("at least one of professional-fee or payroll income must be greater than zero")]
    NoIncome,
}

/// The four expense categories SUNAT accepts as additional deductions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductibleExpenses {
    pub lodging_and_restaurants: Decimal,
    pub professional_services: Decimal,
    pub rent: Decimal,
    pub household_workers: Decimal,
}

impl DeductibleExpenses {
    /// Raw sum of the categories, before any cap. `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        self.lodging_and_restaurants
            .checked_add(self.professional_services)?
            .checked_add(self.rent)?
            .checked_add(self.household_workers)
    }

    pub(crate) fn amounts(&self) -> [(&'static str, Decimal); 4] {
        [
            ("lodging_and_restaurants", self.lodging_and_restaurants),
            ("professional_services", self.professional_services),
            ("rent", self.rent),
            ("household_workers", self.household_workers),
        ]
    }
}

/// Tax already withheld at source during the year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withholdings {
    pub professional_fee: Decimal,
    pub payroll: Decimal,
}

impl Withholdings {
    /// `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        self.professional_fee.checked_add(self.payroll)
    }
}

/// Everything the calculator needs for one taxpayer and year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeDeclaration {
    /// 4th category income (independent professional fees).
    pub professional_fee_income: Decimal,
    pub professional_fee_period: IncomePeriod,

    /// 5th category income (payroll wages).
    pub payroll_income: Decimal,
    pub payroll_period: IncomePeriod,

    pub deductible_expenses: DeductibleExpenses,
    pub withholdings: Withholdings,
}

impl IncomeDeclaration {
    /// Returns the first negative amount in the declaration, if any.
    pub fn first_negative_amount(&self) -> Option<(&'static str, Decimal)> {
        let incomes = [
            ("professional_fee_income", self.professional_fee_income),
            ("payroll_income", self.payroll_income),
        ];
        let withholdings = [
            ("professional_fee_withholding", self.withholdings.professional_fee),
            ("payroll_withholding", self.withholdings.payroll),
        ];

        incomes
            .into_iter()
            .chain(self.deductible_expenses.amounts())
            .chain(withholdings)
            .find(|(_, value)| *value < Decimal::ZERO)
    }

    /// Admission rule applied by input collectors before calculating.
    ///
    /// # Errors
    ///
    /// * [`DeclarationError::NegativeAmount`] for any negative figure.
    /// * [`DeclarationError::NoIncome`] when both incomes are zero.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        if let Some((field, value)) = self.first_negative_amount() {
            return Err(DeclarationError::NegativeAmount { field, value });
        }
        if self.professional_fee_income <= Decimal::ZERO && self.payroll_income <= Decimal::ZERO {
            return Err(DeclarationError::NoIncome);
        }
        Ok(())
    }
}

//! The statutory constants and progressive brackets for one tax year.
//!
//! Every currency amount derived from a [`RateTable`] is computed by
//! multiplying against its single `monetary_unit` field, so changing the UIT
//! for a new tax year is a data change only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TaxBracket;

/// Integrity failures in a rate table. These are configuration errors,
/// caught once when a calculator is built rather than on every calculation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    #[error("monetary unit must be positive, got {0}")]
    InvalidMonetaryUnit(Decimal),

    #[error("rate table has no brackets")]
    NoTaxBrackets,

    #[error("first bracket must start at 0 UIT, starts at {0}")]
    FirstBracketNotAtZero(Decimal),

    #[error("bracket {index} upper bound {upper} is not above its lower bound {lower}")]
    NonIncreasingBounds {
        index: usize,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("gap before bracket {index}: previous bracket ends at {expected}, next starts at {found}")]
    Gap {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("bracket {index} overlaps its predecessor: previous ends at {expected}, next starts at {found}")]
    Overlap {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("open-ended bracket {0} is not the last bracket")]
    OpenBracketNotLast(usize),

    #[error("last bracket must be open-ended")]
    MissingOpenBracket,

    #[error("bracket {index} rate must be between 0 and 1, got {rate}")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("professional-fee deduction rate must be between 0 and 1, got {0}")]
    InvalidDeductionRate(Decimal),

    #[error("{name} must be non-negative, got {value}")]
    NegativeMultiplier { name: &'static str, value: Decimal },
}

/// Versioned tax configuration handed to the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub tax_year: i32,

    /// The UIT (Unidad Impositiva Tributaria) in soles.
    pub monetary_unit: Decimal,

    /// Flat deduction, in UIT, applied once to combined labor income.
    pub fixed_deduction_units: Decimal,

    /// Share of professional-fee (4th category) income deducted before
    /// combining it with payroll income.
    pub professional_fee_deduction_rate: Decimal,

    /// Ceiling, in UIT, on the sum of deductible expenses.
    pub expense_cap_units: Decimal,

    /// Ascending brackets; the last one is open-ended.
    pub brackets: Vec<TaxBracket>,
}

impl RateTable {
    /// The 2024 schedule: UIT 5,150, 7 UIT fixed deduction, 20 % fee
    /// deduction, 3 UIT expense cap and the five-step 8–30 % scale.
    pub fn peru_2024() -> Self {
        Self {
            tax_year: 2024,
            monetary_unit: Decimal::new(5150, 0),
            fixed_deduction_units: Decimal::new(7, 0),
            professional_fee_deduction_rate: Decimal::new(20, 2),
            expense_cap_units: Decimal::new(3, 0),
            brackets: vec![
                TaxBracket::new(Decimal::ZERO, Some(Decimal::new(5, 0)), Decimal::new(8, 2)),
                TaxBracket::new(Decimal::new(5, 0), Some(Decimal::new(20, 0)), Decimal::new(14, 2)),
                TaxBracket::new(Decimal::new(20, 0), Some(Decimal::new(35, 0)), Decimal::new(17, 2)),
                TaxBracket::new(Decimal::new(35, 0), Some(Decimal::new(45, 0)), Decimal::new(20, 2)),
                TaxBracket::new(Decimal::new(45, 0), None, Decimal::new(30, 2)),
            ],
        }
    }

    pub fn fixed_deduction(&self) -> Decimal {
        self.fixed_deduction_units * self.monetary_unit
    }

    pub fn expense_cap(&self) -> Decimal {
        self.expense_cap_units * self.monetary_unit
    }

    /// Width of a bracket in soles, or `None` for the open top bracket.
    pub fn bracket_width(
        &self,
        bracket: &TaxBracket,
    ) -> Option<Decimal> {
        bracket
            .upper_uit
            .map(|upper| (upper - bracket.lower_uit) * self.monetary_unit)
    }

    /// Checks that the brackets partition `[0, ∞)` exactly once and that
    /// every constant is in range.
    ///
    /// # Errors
    ///
    /// Returns the first [`RateTableError`] found, scanning constants first
    /// and then brackets in ascending order.
    pub fn validate(&self) -> Result<(), RateTableError> {
        if self.monetary_unit <= Decimal::ZERO {
            return Err(RateTableError::InvalidMonetaryUnit(self.monetary_unit));
        }
        if self.professional_fee_deduction_rate < Decimal::ZERO
            || self.professional_fee_deduction_rate > Decimal::ONE
        {
            return Err(RateTableError::InvalidDeductionRate(
                self.professional_fee_deduction_rate,
            ));
        }
        for (name, value) in [
            ("fixed_deduction_units", self.fixed_deduction_units),
            ("expense_cap_units", self.expense_cap_units),
        ] {
            if value < Decimal::ZERO {
                return Err(RateTableError::NegativeMultiplier { name, value });
            }
        }

        let first = self.brackets.first().ok_or(RateTableError::NoTaxBrackets)?;
        if first.lower_uit != Decimal::ZERO {
            return Err(RateTableError::FirstBracketNotAtZero(first.lower_uit));
        }

        let last_index = self.brackets.len() - 1;
        let mut previous_upper: Option<Decimal> = None;

        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(RateTableError::InvalidRate {
                    index,
                    rate: bracket.rate,
                });
            }

            if let Some(expected) = previous_upper {
                if bracket.lower_uit > expected {
                    return Err(RateTableError::Gap {
                        index,
                        expected,
                        found: bracket.lower_uit,
                    });
                }
                if bracket.lower_uit < expected {
                    return Err(RateTableError::Overlap {
                        index,
                        expected,
                        found: bracket.lower_uit,
                    });
                }
            }

            match bracket.upper_uit {
                Some(upper) if upper <= bracket.lower_uit => {
                    return Err(RateTableError::NonIncreasingBounds {
                        index,
                        lower: bracket.lower_uit,
                        upper,
                    });
                }
                Some(upper) => previous_upper = Some(upper),
                None if index != last_index => {
                    return Err(RateTableError::OpenBracketNotLast(index));
                }
                None => {}
            }
        }

        if !self.brackets[last_index].is_open() {
            return Err(RateTableError::MissingOpenBracket);
        }

        Ok(())
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::peru_2024()
    }
}

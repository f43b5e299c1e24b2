//! Annual labor income tax (4th and 5th category) calculation.
//!
//! # Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Annualize each income (monthly × 12) |
//! | 2    | Professional-fee deduction: annual 4th category income × 20 % |
//! | 3    | Fixed deduction: 7 UIT, once |
//! | 4    | Deductible expenses: sum of categories, capped at 3 UIT |
//! | 5    | Gross labor income: (fees − fee deduction) + payroll |
//! | 6    | Taxable net income: step 5 − step 3 − step 4, minimum 0 |
//! | 7    | Tax: progressive brackets applied slice by slice |
//! | 8    | Withholdings: 4th + 5th category |
//! | 9    | Balance: step 7 − step 8; ≤ 0 favors the taxpayer |
//!
//! Arithmetic is exact decimal throughout; nothing is rounded here.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use renta_core::calculations::IncomeTaxCalculator;
//! use renta_core::{BalanceDirection, IncomeDeclaration, IncomePeriod, RateTable, Withholdings};
//!
//! let calculator = IncomeTaxCalculator::new(RateTable::peru_2024()).unwrap();
//!
//! let declaration = IncomeDeclaration {
//!     payroll_income: dec!(5000),
//!     payroll_period: IncomePeriod::Monthly,
//!     withholdings: Withholdings {
//!         professional_fee: dec!(800),
//!         payroll: dec!(3500),
//!     },
//!     ..Default::default()
//! };
//!
//! let result = calculator.calculate(&declaration).unwrap();
//!
//! assert_eq!(result.taxable_net_income, dec!(23950));
//! assert_eq!(result.computed_tax, dec!(1916));
//! assert_eq!(result.balance, dec!(2384));
//! assert_eq!(result.balance_direction, BalanceDirection::Favor);
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::max;
use crate::models::{
    BalanceDirection, BracketApportionment, DeductibleExpenses, ExpenseBreakdown,
    IncomeDeclaration, RateTable, RateTableError, TaxCalculationResult,
};

/// Errors that can occur during a calculation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncomeTaxError {
    /// An income, expense or withholding figure was negative.
    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    /// An intermediate amount does not fit in a [`Decimal`].
    #[error("{field} is too large to calculate")]
    AmountTooLarge { field: &'static str },
}

fn checked(
    value: Option<Decimal>,
    field: &'static str,
) -> Result<Decimal, IncomeTaxError> {
    value.ok_or(IncomeTaxError::AmountTooLarge { field })
}

/// Calculator bound to one validated [`RateTable`].
///
/// Holds no mutable state, so one instance can serve any number of callers
/// concurrently.
#[derive(Debug, Clone)]
pub struct IncomeTaxCalculator {
    rate_table: RateTable,
}

impl IncomeTaxCalculator {
    /// Validates `rate_table` once and binds it to a new calculator.
    ///
    /// # Errors
    ///
    /// Returns [`RateTableError`] if the brackets do not partition `[0, ∞)`
    /// or a constant is out of range.
    pub fn new(rate_table: RateTable) -> Result<Self, RateTableError> {
        rate_table.validate()?;
        Ok(Self { rate_table })
    }

    pub fn rate_table(&self) -> &RateTable {
        &self.rate_table
    }

    /// Runs every step for one declaration.
    ///
    /// Only non-negativity is checked here; the at-least-one-income rule
    /// belongs to whoever collects the declaration
    /// (see [`IncomeDeclaration::validate`]).
    ///
    /// # Errors
    ///
    /// * [`IncomeTaxError::NegativeAmount`] for the first negative figure.
    /// * [`IncomeTaxError::AmountTooLarge`] when an amount overflows.
    pub fn calculate(
        &self,
        declaration: &IncomeDeclaration,
    ) -> Result<TaxCalculationResult, IncomeTaxError> {
        if let Some((field, value)) = declaration.first_negative_amount() {
            return Err(IncomeTaxError::NegativeAmount { field, value });
        }

        let annual_professional_fee_income = checked(
            declaration
                .professional_fee_period
                .annualize(declaration.professional_fee_income),
            "annual_professional_fee_income",
        )?;
        let annual_payroll_income = checked(
            declaration
                .payroll_period
                .annualize(declaration.payroll_income),
            "annual_payroll_income",
        )?;

        let professional_fee_deduction =
            self.professional_fee_deduction(annual_professional_fee_income)?;
        let fixed_deduction = self.rate_table.fixed_deduction();
        let deductible_expenses = self.expense_breakdown(&declaration.deductible_expenses)?;

        let gross_labor_income = self.gross_labor_income(
            annual_professional_fee_income,
            professional_fee_deduction,
            annual_payroll_income,
        )?;
        let taxable_net_income = self.taxable_net_income(
            gross_labor_income,
            fixed_deduction,
            deductible_expenses.total,
        );

        let bracket_breakdown = self.apportion(taxable_net_income);
        let computed_tax: Decimal = bracket_breakdown.iter().map(|slice| slice.tax).sum();

        let total_withholdings =
            checked(declaration.withholdings.total(), "total_withholdings")?;
        let (balance, balance_direction) = self.balance(computed_tax, total_withholdings);

        debug!(
            %taxable_net_income,
            %computed_tax,
            %total_withholdings,
            %balance,
            direction = balance_direction.as_str(),
            brackets_used = bracket_breakdown.len(),
            "income tax calculated"
        );

        Ok(TaxCalculationResult {
            annual_professional_fee_income,
            annual_payroll_income,
            professional_fee_deduction,
            fixed_deduction,
            deductible_expenses,
            taxable_net_income,
            computed_tax,
            total_withholdings,
            balance,
            balance_direction,
            bracket_breakdown,
        })
    }

    /// Deduction on professional-fee income only; payroll income never
    /// receives it.
    fn professional_fee_deduction(
        &self,
        annual_professional_fee_income: Decimal,
    ) -> Result<Decimal, IncomeTaxError> {
        checked(
            annual_professional_fee_income
                .checked_mul(self.rate_table.professional_fee_deduction_rate),
            "professional_fee_deduction",
        )
    }

    /// Caps the sum of the categories, not each category.
    fn expense_breakdown(
        &self,
        expenses: &DeductibleExpenses,
    ) -> Result<ExpenseBreakdown, IncomeTaxError> {
        let raw_total = checked(expenses.total(), "deductible_expenses")?;
        let total = raw_total.min(self.rate_table.expense_cap());

        if total < raw_total {
            debug!(%raw_total, cap = %total, "deductible expenses capped");
        }

        Ok(ExpenseBreakdown {
            lodging_and_restaurants: expenses.lodging_and_restaurants,
            professional_services: expenses.professional_services,
            rent: expenses.rent,
            household_workers: expenses.household_workers,
            raw_total,
            total,
        })
    }

    fn gross_labor_income(
        &self,
        annual_professional_fee_income: Decimal,
        professional_fee_deduction: Decimal,
        annual_payroll_income: Decimal,
    ) -> Result<Decimal, IncomeTaxError> {
        checked(
            (annual_professional_fee_income - professional_fee_deduction)
                .checked_add(annual_payroll_income),
            "gross_labor_income",
        )
    }

    fn taxable_net_income(
        &self,
        gross_labor_income: Decimal,
        fixed_deduction: Decimal,
        capped_expenses: Decimal,
    ) -> Decimal {
        max(
            gross_labor_income - fixed_deduction - capped_expenses,
            Decimal::ZERO,
        )
    }

    /// Splits taxable income across the brackets in ascending order.
    ///
    /// The open top bracket absorbs whatever remains. Brackets past the
    /// point where income runs out are not listed.
    fn apportion(
        &self,
        taxable_net_income: Decimal,
    ) -> Vec<BracketApportionment> {
        let mut remaining = taxable_net_income;
        let mut slices = Vec::new();

        for bracket in &self.rate_table.brackets {
            if remaining <= Decimal::ZERO {
                break;
            }

            let width = self
                .rate_table
                .bracket_width(bracket)
                .unwrap_or(remaining);
            let taxable_amount = remaining.min(width);

            slices.push(BracketApportionment {
                lower_uit: bracket.lower_uit,
                upper_uit: bracket.upper_uit,
                rate: bracket.rate,
                taxable_amount,
                tax: taxable_amount * bracket.rate,
            });
            remaining -= taxable_amount;
        }

        slices
    }

    /// Returns the balance magnitude and who it favors.
    fn balance(
        &self,
        computed_tax: Decimal,
        total_withholdings: Decimal,
    ) -> (Decimal, BalanceDirection) {
        let signed = computed_tax - total_withholdings;
        (signed.abs(), BalanceDirection::from_signed_balance(signed))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{IncomePeriod, TaxBracket, Withholdings};

    fn calculator() -> IncomeTaxCalculator {
        IncomeTaxCalculator::new(RateTable::peru_2024()).unwrap()
    }

    fn annual_payroll(amount: Decimal) -> IncomeDeclaration {
        IncomeDeclaration {
            payroll_income: amount,
            payroll_period: IncomePeriod::Annual,
            ..Default::default()
        }
    }

    // =========================================================================
    // construction
    // =========================================================================

    #[test]
    fn new_rejects_invalid_rate_table() {
        let table = RateTable {
            brackets: vec![TaxBracket::new(dec!(0), Some(dec!(5)), dec!(0.08))],
            ..RateTable::peru_2024()
        };

        assert_eq!(
            IncomeTaxCalculator::new(table).unwrap_err(),
            RateTableError::MissingOpenBracket
        );
    }

    #[test]
    fn calculator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IncomeTaxCalculator>();
    }

    // =========================================================================
    // professional_fee_deduction tests
    // =========================================================================

    #[test]
    fn professional_fee_deduction_is_twenty_percent() {
        assert_eq!(
            calculator().professional_fee_deduction(dec!(10000)),
            Ok(dec!(2000))
        );
    }

    #[test]
    fn professional_fee_deduction_ignores_payroll() {
        let result = calculator()
            .calculate(&annual_payroll(dec!(90000)))
            .unwrap();

        assert_eq!(result.professional_fee_deduction, dec!(0));
    }

    // =========================================================================
    // expense_breakdown tests
    // =========================================================================

    #[test]
    fn expense_breakdown_keeps_sum_under_cap() {
        let expenses = DeductibleExpenses {
            lodging_and_restaurants: dec!(1200),
            professional_services: dec!(2500),
            rent: dec!(800),
            household_workers: dec!(1000),
        };

        let breakdown = calculator().expense_breakdown(&expenses).unwrap();

        assert_eq!(breakdown.raw_total, dec!(5500));
        assert_eq!(breakdown.total, dec!(5500));
        assert!(!breakdown.is_capped());
    }

    #[test]
    fn expense_breakdown_caps_sum_and_keeps_raw_categories() {
        let expenses = DeductibleExpenses {
            lodging_and_restaurants: dec!(5000),
            professional_services: dec!(5000),
            rent: dec!(6000),
            household_workers: dec!(4000),
        };

        let breakdown = calculator().expense_breakdown(&expenses).unwrap();

        assert_eq!(breakdown.rent, dec!(6000));
        assert_eq!(breakdown.raw_total, dec!(20000));
        assert_eq!(breakdown.total, dec!(15450));
    }

    #[test]
    fn expense_breakdown_at_exact_cap_is_not_capped() {
        let expenses = DeductibleExpenses {
            rent: dec!(15450),
            ..Default::default()
        };

        let breakdown = calculator().expense_breakdown(&expenses).unwrap();

        assert_eq!(breakdown.total, dec!(15450));
        assert!(!breakdown.is_capped());
    }

    // =========================================================================
    // taxable_net_income tests
    // =========================================================================

    #[test]
    fn taxable_net_income_subtracts_deductions() {
        assert_eq!(
            calculator().taxable_net_income(dec!(60000), dec!(36050), dec!(0)),
            dec!(23950)
        );
    }

    #[test]
    fn taxable_net_income_floors_at_zero() {
        assert_eq!(
            calculator().taxable_net_income(dec!(8000), dec!(36050), dec!(6000)),
            dec!(0)
        );
    }

    // =========================================================================
    // apportion tests
    // =========================================================================

    #[test]
    fn apportion_returns_nothing_for_zero_income() {
        assert!(calculator().apportion(dec!(0)).is_empty());
    }

    #[test]
    fn apportion_within_first_bracket() {
        let slices = calculator().apportion(dec!(23950));

        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].taxable_amount, dec!(23950));
        assert_eq!(slices[0].tax, dec!(1916));
    }

    #[test]
    fn apportion_at_exact_bracket_boundary_stops() {
        let slices = calculator().apportion(dec!(25750));

        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].tax, dec!(2060));
    }

    #[test]
    fn apportion_spills_into_second_bracket() {
        let slices = calculator().apportion(dec!(30750));

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].taxable_amount, dec!(25750));
        assert_eq!(slices[1].taxable_amount, dec!(5000));
        assert_eq!(slices[1].tax, dec!(700));
    }

    #[test]
    fn apportion_applies_top_rate_to_remainder_only() {
        // 45 UIT = 231,750; everything above it is taxed at 30 %.
        let slices = calculator().apportion(dec!(331750));

        assert_eq!(slices.len(), 5);
        assert_eq!(slices[4].lower_uit, dec!(45));
        assert_eq!(slices[4].upper_uit, None);
        assert_eq!(slices[4].taxable_amount, dec!(100000));
        assert_eq!(slices[4].tax, dec!(30000));

        let total: Decimal = slices.iter().map(|s| s.tax).sum();
        // 2,060 + 10,815 + 13,132.50 + 10,300 + 30,000
        assert_eq!(total, dec!(66307.50));
    }

    // =========================================================================
    // balance tests
    // =========================================================================

    #[test]
    fn balance_favors_taxpayer_when_overwithheld() {
        assert_eq!(
            calculator().balance(dec!(1916), dec!(4300)),
            (dec!(2384), BalanceDirection::Favor)
        );
    }

    #[test]
    fn balance_tie_favors_taxpayer() {
        assert_eq!(
            calculator().balance(dec!(1916), dec!(1916)),
            (dec!(0), BalanceDirection::Favor)
        );
    }

    #[test]
    fn balance_against_taxpayer_when_underwithheld() {
        assert_eq!(
            calculator().balance(dec!(5000), dec!(1200.50)),
            (dec!(3799.50), BalanceDirection::Against)
        );
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_combines_both_income_streams() {
        let declaration = IncomeDeclaration {
            professional_fee_income: dec!(4000),
            professional_fee_period: IncomePeriod::Monthly,
            payroll_income: dec!(6000),
            payroll_period: IncomePeriod::Monthly,
            deductible_expenses: DeductibleExpenses {
                lodging_and_restaurants: dec!(1200),
                professional_services: dec!(2500),
                rent: dec!(800),
                household_workers: dec!(1000),
            },
            withholdings: Withholdings {
                professional_fee: dec!(800),
                payroll: dec!(3500),
            },
        };

        let result = calculator().calculate(&declaration).unwrap();

        assert_eq!(result.annual_professional_fee_income, dec!(48000));
        assert_eq!(result.annual_payroll_income, dec!(72000));
        assert_eq!(result.professional_fee_deduction, dec!(9600));
        // (48,000 - 9,600) + 72,000 - 36,050 - 5,500
        assert_eq!(result.taxable_net_income, dec!(68850));
        // 25,750 × 8 % + 43,100 × 14 %
        assert_eq!(result.computed_tax, dec!(8094));
        assert_eq!(result.total_withholdings, dec!(4300));
        assert_eq!(result.balance, dec!(3794));
        assert_eq!(result.balance_direction, BalanceDirection::Against);
        assert_eq!(result.signed_balance(), dec!(3794));
    }

    #[test]
    fn calculate_rejects_negative_income() {
        let declaration = annual_payroll(dec!(-1));

        assert_eq!(
            calculator().calculate(&declaration),
            Err(IncomeTaxError::NegativeAmount {
                field: "payroll_income",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn calculate_rejects_negative_withholding() {
        let mut declaration = annual_payroll(dec!(50000));
        declaration.withholdings.professional_fee = dec!(-0.01);

        assert_eq!(
            calculator().calculate(&declaration),
            Err(IncomeTaxError::NegativeAmount {
                field: "professional_fee_withholding",
                value: dec!(-0.01),
            })
        );
    }

    #[test]
    fn calculate_reports_monthly_income_past_decimal_range() {
        let declaration = IncomeDeclaration {
            payroll_income: Decimal::MAX / dec!(10),
            payroll_period: IncomePeriod::Monthly,
            ..Default::default()
        };

        assert_eq!(
            calculator().calculate(&declaration),
            Err(IncomeTaxError::AmountTooLarge {
                field: "annual_payroll_income",
            })
        );
    }

    #[test]
    fn calculate_reports_income_sum_past_decimal_range() {
        let declaration = IncomeDeclaration {
            professional_fee_income: Decimal::MAX,
            professional_fee_period: IncomePeriod::Annual,
            payroll_income: Decimal::MAX,
            payroll_period: IncomePeriod::Annual,
            ..Default::default()
        };

        assert_eq!(
            calculator().calculate(&declaration),
            Err(IncomeTaxError::AmountTooLarge {
                field: "gross_labor_income",
            })
        );
    }

    #[test]
    fn calculate_reports_expense_and_withholding_sums_past_decimal_range() {
        let mut declaration = annual_payroll(dec!(60000));
        declaration.withholdings = Withholdings {
            professional_fee: Decimal::MAX,
            payroll: Decimal::MAX,
        };
        assert_eq!(
            calculator().calculate(&declaration),
            Err(IncomeTaxError::AmountTooLarge {
                field: "total_withholdings",
            })
        );

        declaration.withholdings = Withholdings::default();
        declaration.deductible_expenses.rent = Decimal::MAX;
        declaration.deductible_expenses.lodging_and_restaurants = Decimal::MAX;
        assert_eq!(
            calculator().calculate(&declaration),
            Err(IncomeTaxError::AmountTooLarge {
                field: "deductible_expenses",
            })
        );
    }

    #[test]
    fn calculate_handles_largest_annual_income() {
        let result = calculator()
            .calculate(&annual_payroll(Decimal::MAX))
            .unwrap();

        assert_eq!(result.annual_payroll_income, Decimal::MAX);
        assert_eq!(result.balance_direction, BalanceDirection::Against);
    }

    #[test]
    fn calculate_does_not_require_income() {
        let result = calculator()
            .calculate(&IncomeDeclaration::default())
            .unwrap();

        assert_eq!(result.computed_tax, dec!(0));
        assert_eq!(result.balance_direction, BalanceDirection::Favor);
    }

    #[test]
    fn calculate_uses_supplied_monetary_unit() {
        let table = RateTable {
            monetary_unit: dec!(5350),
            ..RateTable::peru_2024()
        };
        let calculator = IncomeTaxCalculator::new(table).unwrap();

        let result = calculator.calculate(&annual_payroll(dec!(60000))).unwrap();

        assert_eq!(result.fixed_deduction, dec!(37450));
        assert_eq!(result.taxable_net_income, dec!(22550));
        assert_eq!(result.computed_tax, dec!(1804));
    }
}

//! Flat summary shape returned by the remote calculation service.
//!
//! The service reports string-encoded totals with no per-category expense
//! breakdown. It is kept as a separate, lower-fidelity type: it can always be
//! derived from a [`TaxCalculationResult`], but never the other way round.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BalanceDirection, TaxCalculationResult};
use crate::calculations::common::round_half_up;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    pub professional_fees_income: String,
    pub payroll_income: String,
    pub calculated_tax: String,
    pub fifth_category_withholding: String,
    /// Signed: negative when the taxpayer is owed a refund.
    pub tax_difference: String,
    pub deductible_expenses: String,
}

impl TaxSummary {
    pub fn tax_difference_amount(&self) -> Option<Decimal> {
        Decimal::from_str(self.tax_difference.trim()).ok()
    }

    /// Direction of the signed difference, with zero going to the taxpayer
    /// exactly as in the itemized result.
    pub fn direction(&self) -> Option<BalanceDirection> {
        self.tax_difference_amount()
            .map(BalanceDirection::from_signed_balance)
    }
}

fn money(value: Decimal) -> String {
    format!("{:.2}", round_half_up(value))
}

impl From<&TaxCalculationResult> for TaxSummary {
    fn from(result: &TaxCalculationResult) -> Self {
        Self {
            professional_fees_income: money(result.annual_professional_fee_income),
            payroll_income: money(result.annual_payroll_income),
            calculated_tax: money(result.computed_tax),
            fifth_category_withholding: money(result.total_withholdings),
            tax_difference: money(result.signed_balance()),
            deductible_expenses: money(result.deductible_expenses.total),
        }
    }
}

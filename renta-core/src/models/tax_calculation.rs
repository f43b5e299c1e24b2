use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who the final balance favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceDirection {
    /// The taxpayer overpaid and is owed a refund.
    Favor,
    /// The taxpayer owes the difference to the tax authority.
    Against,
}

impl BalanceDirection {
    /// Classifies a signed balance (`computed tax - withholdings`).
    /// A balance of exactly zero goes to the taxpayer.
    pub fn from_signed_balance(balance: Decimal) -> Self {
        if balance <= Decimal::ZERO {
            Self::Favor
        } else {
            Self::Against
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favor => "favor",
            Self::Against => "against",
        }
    }

    /// Also accepts the Spanish tag `"contra"`. The SQLite store only ever
    /// writes `"favor"` or `"against"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "favor" => Some(Self::Favor),
            "against" | "contra" => Some(Self::Against),
            _ => None,
        }
    }
}

impl std::fmt::Display for BalanceDirection {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deductible expenses as entered, plus the capped total that has tax effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub lodging_and_restaurants: Decimal,
    pub professional_services: Decimal,
    pub rent: Decimal,
    pub household_workers: Decimal,
    /// Sum of the categories before the cap.
    pub raw_total: Decimal,
    /// `min(raw_total, cap)`.
    pub total: Decimal,
}

impl ExpenseBreakdown {
    pub fn is_capped(&self) -> bool {
        self.total < self.raw_total
    }
}

/// The share of taxable income that fell into one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketApportionment {
    pub lower_uit: Decimal,
    pub upper_uit: Option<Decimal>,
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub tax: Decimal,
}

/// Fully itemized outcome of one calculation. Amounts are unrounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    pub annual_professional_fee_income: Decimal,
    pub annual_payroll_income: Decimal,
    pub professional_fee_deduction: Decimal,
    pub fixed_deduction: Decimal,
    pub deductible_expenses: ExpenseBreakdown,
    pub taxable_net_income: Decimal,
    pub computed_tax: Decimal,
    pub total_withholdings: Decimal,
    /// Magnitude of the final balance; read the direction from
    /// `balance_direction`, never from a sign.
    pub balance: Decimal,
    pub balance_direction: BalanceDirection,
    pub bracket_breakdown: Vec<BracketApportionment>,
}

impl TaxCalculationResult {
    /// Balance with the sign restored: positive when the taxpayer owes.
    pub fn signed_balance(&self) -> Decimal {
        if self.balance.is_zero() {
            return Decimal::ZERO;
        }
        match self.balance_direction {
            BalanceDirection::Favor => -self.balance,
            BalanceDirection::Against => self.balance,
        }
    }

    pub fn is_refund(&self) -> bool {
        self.balance_direction == BalanceDirection::Favor
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn zero_balance_favors_taxpayer() {
        assert_eq!(
            BalanceDirection::from_signed_balance(dec!(0)),
            BalanceDirection::Favor
        );
    }

    #[test]
    fn negative_balance_favors_taxpayer() {
        assert_eq!(
            BalanceDirection::from_signed_balance(dec!(-2384)),
            BalanceDirection::Favor
        );
    }

    #[test]
    fn positive_balance_is_against_taxpayer() {
        assert_eq!(
            BalanceDirection::from_signed_balance(dec!(0.01)),
            BalanceDirection::Against
        );
    }

    #[test]
    fn parse_accepts_spanish_contra() {
        assert_eq!(BalanceDirection::parse("contra"), Some(BalanceDirection::Against));
        assert_eq!(BalanceDirection::parse("against"), Some(BalanceDirection::Against));
        assert_eq!(BalanceDirection::parse("favor"), Some(BalanceDirection::Favor));
        assert_eq!(BalanceDirection::parse("FAVOR"), None);
    }

    #[test]
    fn serializes_as_lowercase_tag() {
        let json = serde_json::to_string(&BalanceDirection::Against).unwrap();

        assert_eq!(json, "\"against\"");
    }

    #[test]
    fn expense_breakdown_reports_cap() {
        let breakdown = ExpenseBreakdown {
            lodging_and_restaurants: dec!(20000),
            professional_services: dec!(0),
            rent: dec!(0),
            household_workers: dec!(0),
            raw_total: dec!(20000),
            total: dec!(15450),
        };

        assert!(breakdown.is_capped());
    }
}

//! Plain-text rendering of results, history and rate tables.
//!
//! This is the only place amounts are rounded: to céntimos, half up.
use std::fmt;

use renta_core::calculations::common::round_half_up;
use renta_core::{BalanceDirection, RateTable, SavedCalculation, TaxCalculationResult};
use rust_decimal::Decimal;

fn money(amount: Decimal) -> String {
    format!("{:.2}", round_half_up(amount))
}

fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

fn bracket_label(
    lower_uit: Decimal,
    upper_uit: Option<Decimal>,
) -> String {
    match upper_uit {
        Some(upper) => format!("{} - {} UIT", lower_uit.normalize(), upper.normalize()),
        None => format!("over {} UIT", lower_uit.normalize()),
    }
}

fn balance_label(direction: BalanceDirection) -> &'static str {
    match direction {
        BalanceDirection::Favor => "Balance in your favor",
        BalanceDirection::Against => "Balance payable",
    }
}

/// Itemized report of one calculation.
pub struct CalculationReport<'a> {
    pub result: &'a TaxCalculationResult,
    pub rate_table: &'a RateTable,
}

impl fmt::Display for CalculationReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let r = self.result;
        let table = self.rate_table;
        let expenses = &r.deductible_expenses;

        writeln!(
            f,
            "Professional-fee income:            {:>14}",
            money(r.annual_professional_fee_income)
        )?;
        writeln!(
            f,
            "  less {:<30}{:>14}",
            format!("{} deduction:", percent(table.professional_fee_deduction_rate)),
            money(r.professional_fee_deduction)
        )?;
        writeln!(
            f,
            "Payroll income:                     {:>14}",
            money(r.annual_payroll_income)
        )?;
        writeln!(
            f,
            "  less {:<30}{:>14}",
            format!("{} UIT deduction:", table.fixed_deduction_units.normalize()),
            money(r.fixed_deduction)
        )?;
        writeln!(f, "Deductible expenses:")?;
        writeln!(
            f,
            "  lodging and restaurants:          {:>14}",
            money(expenses.lodging_and_restaurants)
        )?;
        writeln!(
            f,
            "  professional services:            {:>14}",
            money(expenses.professional_services)
        )?;
        writeln!(f, "  rent:                             {:>14}", money(expenses.rent))?;
        writeln!(
            f,
            "  household workers:                {:>14}",
            money(expenses.household_workers)
        )?;
        if expenses.is_capped() {
            writeln!(
                f,
                "  capped at {} UIT (entered {}):",
                table.expense_cap_units.normalize(),
                money(expenses.raw_total)
            )?;
        }
        writeln!(
            f,
            "  less deductible total:            {:>14}",
            money(expenses.total)
        )?;
        writeln!(
            f,
            "Taxable net income:                 {:>14}",
            money(r.taxable_net_income)
        )?;

        if !r.bracket_breakdown.is_empty() {
            writeln!(f, "Tax by bracket:")?;
            for slice in &r.bracket_breakdown {
                writeln!(
                    f,
                    "  {:<16} @ {:>4} on {:>14} = {:>12}",
                    bracket_label(slice.lower_uit, slice.upper_uit),
                    percent(slice.rate),
                    money(slice.taxable_amount),
                    money(slice.tax)
                )?;
            }
        }

        writeln!(
            f,
            "Computed tax:                       {:>14}",
            money(r.computed_tax)
        )?;
        writeln!(
            f,
            "Withholdings:                       {:>14}",
            money(r.total_withholdings)
        )?;
        write!(
            f,
            "{:<36}{:>14}",
            format!("{}:", balance_label(r.balance_direction)),
            money(r.balance)
        )
    }
}

/// One line per saved calculation, newest first as given.
pub struct HistoryTable<'a>(pub &'a [SavedCalculation]);

impl fmt::Display for HistoryTable<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No saved calculations.");
        }

        write!(
            f,
            "{:>5}  {:>4}  {:<16}  {:>14}  {:>12}  {:>12}  direction",
            "id", "year", "saved", "taxable", "tax", "balance"
        )?;
        for saved in self.0 {
            write!(
                f,
                "\n{:>5}  {:>4}  {:<16}  {:>14}  {:>12}  {:>12}  {}",
                saved.id,
                saved.fiscal_year,
                saved.created_at.format("%Y-%m-%d %H:%M").to_string(),
                money(saved.result.taxable_net_income),
                money(saved.result.computed_tax),
                money(saved.result.balance),
                saved.result.balance_direction
            )?;
        }
        Ok(())
    }
}

/// The constants and brackets of a rate table, with amounts in soles.
pub struct RateTableReport<'a>(pub &'a RateTable);

impl fmt::Display for RateTableReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let table = self.0;

        writeln!(f, "Tax year:                 {}", table.tax_year)?;
        writeln!(f, "UIT:                      {}", money(table.monetary_unit))?;
        writeln!(
            f,
            "Fixed deduction:          {} UIT ({})",
            table.fixed_deduction_units.normalize(),
            money(table.fixed_deduction())
        )?;
        writeln!(
            f,
            "Professional-fee deduction: {}",
            percent(table.professional_fee_deduction_rate)
        )?;
        writeln!(
            f,
            "Expense cap:              {} UIT ({})",
            table.expense_cap_units.normalize(),
            money(table.expense_cap())
        )?;
        write!(f, "Brackets:")?;
        for bracket in &table.brackets {
            write!(
                f,
                "\n  {:<16} {:>4}",
                bracket_label(bracket.lower_uit, bracket.upper_uit),
                percent(bracket.rate)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use renta_core::{IncomeDeclaration, IncomePeriod, IncomeTaxCalculator, Withholdings};
    use rust_decimal_macros::dec;

    use super::*;

    fn refund_result() -> TaxCalculationResult {
        let declaration = IncomeDeclaration {
            payroll_income: dec!(5000),
            payroll_period: IncomePeriod::Monthly,
            withholdings: Withholdings {
                professional_fee: dec!(800),
                payroll: dec!(3500),
            },
            ..Default::default()
        };
        IncomeTaxCalculator::new(RateTable::peru_2024())
            .unwrap()
            .calculate(&declaration)
            .unwrap()
    }

    #[test]
    fn money_rounds_half_up_to_two_places() {
        assert_eq!(money(dec!(7999.992)), "7999.99");
        assert_eq!(money(dec!(0.005)), "0.01");
        assert_eq!(money(dec!(36050)), "36050.00");
    }

    #[test]
    fn percent_and_bracket_labels() {
        assert_eq!(percent(dec!(0.08)), "8%");
        assert_eq!(percent(dec!(0.175)), "17.5%");
        assert_eq!(bracket_label(dec!(5), Some(dec!(20))), "5 - 20 UIT");
        assert_eq!(bracket_label(dec!(45), None), "over 45 UIT");
    }

    #[test]
    fn report_itemizes_a_refund() {
        let result = refund_result();
        let table = RateTable::peru_2024();

        let text = CalculationReport {
            result: &result,
            rate_table: &table,
        }
        .to_string();

        assert!(text.contains("Payroll income:"), "{text}");
        assert!(text.contains("60000.00"), "{text}");
        assert!(text.contains("7 UIT deduction:"), "{text}");
        assert!(text.contains("36050.00"), "{text}");
        assert!(text.contains("0 - 5 UIT"), "{text}");
        assert!(text.contains("1916.00"), "{text}");
        assert!(!text.contains("capped"), "{text}");
        assert_eq!(
            text.lines().last(),
            Some("Balance in your favor:                     2384.00")
        );
    }

    #[test]
    fn report_flags_capped_expenses() {
        let mut result = refund_result();
        result.deductible_expenses.raw_total = dec!(20000);
        result.deductible_expenses.total = dec!(15450);

        let text = CalculationReport {
            result: &result,
            rate_table: &RateTable::peru_2024(),
        }
        .to_string();

        assert!(text.contains("capped at 3 UIT (entered 20000.00)"), "{text}");
    }

    #[test]
    fn empty_history_says_so() {
        assert_eq!(HistoryTable(&[]).to_string(), "No saved calculations.");
    }

    #[test]
    fn history_has_one_line_per_record() {
        let saved = SavedCalculation {
            id: 3,
            fiscal_year: 2024,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap(),
            result: refund_result(),
        };

        let text = HistoryTable(&[saved]).to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("2025-03-10 09:30"), "{text}");
        assert!(lines[1].ends_with("favor"), "{text}");
    }

    #[test]
    fn rate_table_lists_every_bracket() {
        let text = RateTableReport(&RateTable::peru_2024()).to_string();

        assert!(text.contains("UIT:                      5150.00"), "{text}");
        assert!(text.contains("Fixed deduction:          7 UIT (36050.00)"), "{text}");
        assert!(text.contains("over 45 UIT"), "{text}");
        assert_eq!(text.lines().filter(|l| l.contains('%')).count(), 6);
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use renta_core::{DeductibleExpenses, IncomeDeclaration, IncomePeriod, Withholdings};
use rust_decimal::Decimal;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Peruvian labor income tax simulator.
///
/// Computes the annual income tax on professional-fee (4th category) and
/// payroll (5th category) income, and keeps a local history of results.
#[derive(Debug, Parser)]
#[command(name = "renta", version)]
pub struct Cli {
    /// History backend to use.
    #[arg(long, env = "RENTA_DB_BACKEND", default_value = "sqlite", global = true)]
    pub backend: String,

    /// History connection string.
    /// For SQLite this is a file path (e.g. `renta.db`) or `:memory:`.
    #[arg(long, env = "RENTA_DB", default_value = "renta.db", global = true)]
    pub db: String,

    /// TOML rate table to use instead of the built-in 2024 table.
    #[arg(long, env = "RENTA_RATE_TABLE", global = true)]
    pub rate_table: Option<PathBuf>,

    /// Log level or filter directive. `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub taxpayer: TaxpayerArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calculate the tax for one declaration.
    Calculate(CalculateArgs),

    /// Calculate every declaration in a CSV file.
    Batch(BatchArgs),

    /// List saved calculations, newest first.
    History(HistoryArgs),

    /// Show the active rate table.
    RateTable(OutputArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentType {
    Dni,
    Ruc,
}

/// SUNAT identification. Checked and logged masked; never stored.
#[derive(Debug, Clone, Default, Args)]
pub struct TaxpayerArgs {
    #[arg(long, value_enum, global = true)]
    pub document_type: Option<DocumentType>,

    /// DNI (8 digits) or RUC (11 digits).
    #[arg(long, global = true)]
    pub document: Option<String>,

    /// SOL username, required with a RUC.
    #[arg(long, global = true)]
    pub sol_user: Option<String>,

    /// SOL key. Read from the environment only.
    #[arg(skip = std::env::var("RENTA_SOL_KEY").ok())]
    pub sol_key: Option<String>,
}

fn parse_period(s: &str) -> Result<IncomePeriod, String> {
    IncomePeriod::parse(s).ok_or_else(|| format!("unknown period '{s}', expected monthly or annual"))
}

#[derive(Debug, Clone, Args)]
pub struct CalculateArgs {
    /// Professional-fee (4th category) income.
    #[arg(long, default_value = "0")]
    pub fee_income: Decimal,

    #[arg(long, value_parser = parse_period, default_value = "monthly")]
    pub fee_period: IncomePeriod,

    /// Payroll (5th category) income.
    #[arg(long, default_value = "0")]
    pub payroll_income: Decimal,

    #[arg(long, value_parser = parse_period, default_value = "monthly")]
    pub payroll_period: IncomePeriod,

    /// Annual lodging and restaurant expenses.
    #[arg(long, default_value = "0")]
    pub lodging: Decimal,

    /// Annual fees paid for professional services.
    #[arg(long, default_value = "0")]
    pub professional_services: Decimal,

    /// Annual rent paid.
    #[arg(long, default_value = "0")]
    pub rent: Decimal,

    /// Annual contributions for household workers.
    #[arg(long, default_value = "0")]
    pub household_workers: Decimal,

    /// Tax withheld on professional fees during the year.
    #[arg(long, default_value = "0")]
    pub fee_withholding: Decimal,

    /// Tax withheld on payroll during the year.
    #[arg(long, default_value = "0")]
    pub payroll_withholding: Decimal,

    /// Save the result to history under the current fiscal year.
    #[arg(long)]
    pub save: bool,

    /// Print JSON instead of a report.
    #[arg(long)]
    pub json: bool,
}

impl CalculateArgs {
    pub fn declaration(&self) -> IncomeDeclaration {
        IncomeDeclaration {
            professional_fee_income: self.fee_income,
            professional_fee_period: self.fee_period,
            payroll_income: self.payroll_income,
            payroll_period: self.payroll_period,
            deductible_expenses: DeductibleExpenses {
                lodging_and_restaurants: self.lodging,
                professional_services: self.professional_services,
                rent: self.rent,
                household_workers: self.household_workers,
            },
            withholdings: Withholdings {
                professional_fee: self.fee_withholding,
                payroll: self.payroll_withholding,
            },
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// CSV file with one declaration per row.
    #[arg(long)]
    pub file: PathBuf,

    /// Save every result to history under the current fiscal year.
    #[arg(long)]
    pub save: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    /// Only this fiscal year.
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    #[arg(long)]
    pub json: bool,
}

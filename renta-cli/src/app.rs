//! Command dispatch for the `renta` binary.
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use renta_core::db::{DbConfig, InMemoryRepositoryFactory, RepositoryRegistry};
use renta_core::{
    CredentialError, HistoryRepository, IncomeTaxCalculator, NewSavedCalculation, RateTable,
    RepositoryError, SavedCalculation, TaxCalculationResult, TaxSummary, TaxpayerCredentials,
};
use renta_db_sqlite::SqliteRepositoryFactory;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{BatchArgs, CalculateArgs, Cli, Command, DocumentType, HistoryArgs, TaxpayerArgs};
use crate::report::{CalculationReport, HistoryTable, RateTableReport};
use crate::{config, csv_loader};

/// Registry with every backend this binary links against.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(InMemoryRepositoryFactory));
    registry
}

/// Builds and validates credentials from the command line, if any were
/// given.
///
/// # Errors
///
/// Returns the first [`CredentialError`]. A missing document or SOL key is
/// reported the same way as an empty one.
pub fn credentials(args: &TaxpayerArgs) -> Result<Option<TaxpayerCredentials>, CredentialError> {
    let Some(document_type) = args.document_type else {
        return Ok(None);
    };

    let document = args.document.clone().unwrap_or_default();
    let sol_key = args.sol_key.clone().unwrap_or_default();
    let credentials = match document_type {
        DocumentType::Dni => TaxpayerCredentials::Dni { document, sol_key },
        DocumentType::Ruc => TaxpayerCredentials::Ruc {
            document,
            username: args.sol_user.clone().unwrap_or_default(),
            sol_key,
        },
    };

    credentials.validate()?;
    Ok(Some(credentials))
}

/// Stores `result` under the fiscal year that applies on `today`.
pub async fn save_result(
    repo: &dyn HistoryRepository,
    result: TaxCalculationResult,
    today: NaiveDate,
) -> Result<SavedCalculation, RepositoryError> {
    repo.save(NewSavedCalculation::for_date(result, today)).await
}

/// Stores `results` in order under the fiscal year that applies on `today`.
///
/// Saves are not transactional: if one fails, the rows before it stay in
/// history and the error says how many there are.
pub async fn save_all(
    repo: &dyn HistoryRepository,
    results: &[TaxCalculationResult],
    today: NaiveDate,
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(results.len());
    for (idx, result) in results.iter().enumerate() {
        let saved = save_result(repo, result.clone(), today)
            .await
            .with_context(|| {
                format!(
                    "cannot save row {}; {} earlier rows remain saved",
                    idx + 1,
                    ids.len()
                )
            })?;
        ids.push(saved.id);
    }
    Ok(ids)
}

/// JSON shape of one calculation.
#[derive(Debug, Serialize)]
pub struct CalculationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub result: TaxCalculationResult,
    pub summary: TaxSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<i64>,
}

impl CalculationOutput {
    fn new(
        row: Option<usize>,
        result: TaxCalculationResult,
        saved_id: Option<i64>,
    ) -> Self {
        Self {
            row,
            summary: TaxSummary::from(&result),
            result,
            saved_id,
        }
    }
}

async fn open_history(cli: &Cli) -> Result<Box<dyn HistoryRepository>> {
    let db_config = DbConfig {
        backend: cli.backend.clone(),
        connection_string: cli.db.clone(),
    };

    debug!("connecting to {} backend", db_config.backend);
    let repo = build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("cannot open history at '{}'", db_config.connection_string))?;
    Ok(repo)
}

fn write_json<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("cannot encode JSON")?;
    writeln!(out)?;
    Ok(())
}

/// Runs one parsed command line, writing its output to `out`.
pub async fn run<W: Write>(
    cli: Cli,
    out: &mut W,
) -> Result<()> {
    if let Some(taxpayer) = credentials(&cli.taxpayer).context("invalid taxpayer credentials")? {
        info!(
            document_type = taxpayer.document_type(),
            document = %taxpayer.masked_document(),
            "taxpayer identified"
        );
    }

    let rate_table = config::load_rate_table(cli.rate_table.as_deref())?;

    match &cli.command {
        Command::Calculate(args) => calculate(&cli, args, rate_table, out).await,
        Command::Batch(args) => batch(&cli, args, rate_table, out).await,
        Command::History(args) => history(&cli, args, out).await,
        Command::RateTable(args) => {
            if args.json {
                write_json(out, &rate_table)
            } else {
                writeln!(out, "{}", RateTableReport(&rate_table))?;
                Ok(())
            }
        }
    }
}

async fn calculate<W: Write>(
    cli: &Cli,
    args: &CalculateArgs,
    rate_table: RateTable,
    out: &mut W,
) -> Result<()> {
    let declaration = args.declaration();
    declaration.validate()?;

    let calculator = IncomeTaxCalculator::new(rate_table)?;
    let result = calculator.calculate(&declaration)?;
    info!(
        computed_tax = %result.computed_tax,
        balance = %result.balance,
        direction = %result.balance_direction,
        "calculation complete"
    );

    let saved_id = if args.save {
        let repo = open_history(cli).await?;
        let saved = save_result(&*repo, result.clone(), Local::now().date_naive()).await?;
        Some(saved.id)
    } else {
        None
    };

    if args.json {
        return write_json(out, &CalculationOutput::new(None, result, saved_id));
    }

    writeln!(
        out,
        "{}",
        CalculationReport {
            result: &result,
            rate_table: calculator.rate_table(),
        }
    )?;
    if let Some(id) = saved_id {
        writeln!(out, "Saved as #{id}")?;
    }
    Ok(())
}

async fn batch<W: Write>(
    cli: &Cli,
    args: &BatchArgs,
    rate_table: RateTable,
    out: &mut W,
) -> Result<()> {
    let declarations = csv_loader::load_from_file(&args.file)
        .with_context(|| format!("cannot load declarations from '{}'", args.file.display()))?;
    let calculator = IncomeTaxCalculator::new(rate_table)?;

    let results = declarations
        .iter()
        .enumerate()
        .map(|(idx, declaration)| {
            calculator
                .calculate(declaration)
                .with_context(|| format!("cannot calculate row {}", idx + 1))
        })
        .collect::<Result<Vec<_>>>()?;
    info!(rows = results.len(), file = %args.file.display(), "batch calculated");

    let saved_ids: Vec<Option<i64>> = if args.save {
        let repo = open_history(cli).await?;
        save_all(&*repo, &results, Local::now().date_naive())
            .await?
            .into_iter()
            .map(Some)
            .collect()
    } else {
        vec![None; results.len()]
    };

    let outputs: Vec<_> = results
        .into_iter()
        .zip(saved_ids)
        .enumerate()
        .map(|(idx, (result, saved_id))| CalculationOutput::new(Some(idx + 1), result, saved_id))
        .collect();

    if args.json {
        return write_json(out, &outputs);
    }

    for (idx, output) in outputs.iter().enumerate() {
        if idx > 0 {
            writeln!(out)?;
        }
        writeln!(out, "Row {}", idx + 1)?;
        writeln!(
            out,
            "{}",
            CalculationReport {
                result: &output.result,
                rate_table: calculator.rate_table(),
            }
        )?;
        if let Some(id) = output.saved_id {
            writeln!(out, "Saved as #{id}")?;
        }
    }
    Ok(())
}

async fn history<W: Write>(
    cli: &Cli,
    args: &HistoryArgs,
    out: &mut W,
) -> Result<()> {
    let repo = open_history(cli).await?;
    let saved = repo.list(args.year).await?;

    if args.json {
        return write_json(out, &saved);
    }
    writeln!(out, "{}", HistoryTable(&saved))?;
    Ok(())
}

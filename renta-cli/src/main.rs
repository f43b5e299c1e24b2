use std::io;

use clap::Parser;

use renta_cli::cli::Cli;
use renta_cli::{app, logging};

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_file.as_deref())?;

    let stdout = io::stdout();
    app::run(cli, &mut stdout.lock()).await
}

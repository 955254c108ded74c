use clap::Parser;
use envlink_utils::LogFormat;

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "envlink")]
#[command(about = "Resolve secret and config map references in a deployment's environment", long_about = None)]
#[command(version)]
struct Cli {
    /// Log output format (compact, json)
    #[arg(long, global = true, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    envlink_utils::tracing::init(cli.log_format)
        .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))?;

    cli.command.execute().await
}

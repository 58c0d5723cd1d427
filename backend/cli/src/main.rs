mod output;
mod scenario;
mod simulate_cmd;
mod ui_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use permsheet_config::{check, load_with_env};
use permsheet_logging::init_logger;
use scenario::ScenarioArgs;

#[derive(Parser)]
#[command(name = "permsheet")]
#[command(about = "Permission onboarding sheet: catalog, headless simulation, and terminal UI")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true, default_value = "permsheet.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the permission catalog in display order
    Catalog,
    /// Run a headless session against the simulated provider, printing snapshots as JSON lines
    Simulate(ScenarioArgs),
    /// Run a simulated session interactively in the terminal
    Ui(ScenarioArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Catalog = cli.command {
        print!("{}", output::catalog_table());
        return Ok(());
    }

    let mut config = load_with_env(&cli.config).await?;
    if matches!(cli.command, Commands::Ui(_)) && config.logging.dir.is_none() {
        // Console output would tear the alternate screen.
        config.logging.level = "off".to_string();
    }
    init_logger(&config.logging);
    check(&config)?;
    info!(config = %cli.config.display(), dismiss_mode = %config.dismiss_mode, "Configuration loaded");

    match cli.command {
        Commands::Catalog => {}
        Commands::Simulate(args) => simulate_cmd::run(&config, &args).await?,
        Commands::Ui(args) => ui_cmd::run(&config, &args).await?,
    }

    Ok(())
}

use clap::Parser;
use dotenv::dotenv;
use hands_scripts::{cli::Cli, config::DeployConfig, errors::ScriptError};
use tracing::{error, Level};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    // Load .env file
    dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Resolve the config once, nothing below reads the environment
    let config = DeployConfig::from_cli(&cli).inspect_err(|e| {
        error!("{e}");
    })?;

    cli.command.run(&config).await.inspect_err(|e| {
        error!("{e}");
    })
}

use agentpay_cli::Commands;
use agentpay_core::DEFAULT_CONFIG_FILENAME;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agentpay")]
#[command(about = "Obtain and inspect spending mandates for an AI agent", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the agent configuration file
    #[arg(
        long,
        global = true,
        env = "AGENTPAY_CONFIG",
        default_value = DEFAULT_CONFIG_FILENAME
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env is normal; secrets may come from the real environment
    let _ = dotenv::dotenv();

    agentpay_utils::init().map_err(|e| eyre::eyre!("failed to initialize tracing: {e}"))?;

    let cli = Cli::parse();
    let output = cli.command.execute(&cli.config).await?;
    println!("{output}");
    Ok(())
}

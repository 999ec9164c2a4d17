use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pago::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so exports piped through stdout stay clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    cli.run().await
}

mod cli;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetchfan=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Proxy(args) => fetchfan::proxy::run(args.address).await?,
        Commands::Sleepy(args) => fetchfan::sleepy::run(args.address, args.workers).await?,
    }

    Ok(())
}

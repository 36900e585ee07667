// MedChat - medical chat assistant
// Main entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use medchat::cli::{Cli, Command};
use medchat::config::Config;
use medchat::{corpus, server, training};

#[tokio::main]
async fn main() -> Result<()> {
    // Read .env into the process environment before anything looks at it
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Prepare => corpus::build(&config).await,
        Command::Train => {
            // Training is CPU-bound and synchronous end to end
            tokio::task::spawn_blocking(move || training::run(&config)).await?
        }
        Command::Serve => server::serve(config).await,
    }
}

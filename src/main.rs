use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;


use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before settings so FINTRACK_* variables can come from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = config::load_settings(&cli)?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("fintrack starting up");

    let mut stdout = std::io::stdout().lock();
    cli.run(settings, &mut stdout).await
}

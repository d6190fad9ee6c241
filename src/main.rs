use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use interview_prep::cli::{run, Cli};
use interview_prep::config::AppConfig;
use interview_prep::notify::LogNotifier;
use interview_prep::AppServices;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let services = AppServices::from_config(config, Arc::new(LogNotifier))?;

    run(cli, services).await
}

//! Main entry point for Beast Bot.

use beast_bot::BeastBot;
use beast_common::init_logging;
use beast_config::SettingsLoader;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "beast-bot", version, about = "Discord community bot")]
struct Args {
    /// Settings file (TOML or YAML)
    #[arg(short, long, env = "BEAST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overriding the settings file
    #[arg(short, long, env = "BEAST_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut settings = SettingsLoader::load(args.config.as_deref(), true)?;
    if let Some(level) = args.log_level {
        settings.logging.level = level;
    }
    let _log_guard = init_logging(&settings.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Beast Bot");

    let bot = BeastBot::new(settings).await?;
    if let Err(err) = bot.run().await {
        error!(error = %err, "Bot stopped with an error");
        return Err(err.into());
    }

    Ok(())
}

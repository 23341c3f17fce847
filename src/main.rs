mod bot;
mod commands;
mod config;
mod content;
mod driver;
mod handlers;
mod platform;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::BotContext;
use crate::config::Config;
use crate::content::HttpContentClient;
use crate::driver::{PollingDriver, TokioPause};
use crate::platform::telegram::{build_bot, TelegramPoller};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,quranbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &config_path {
        info!("Loading configuration from: {}", path.display());
    }

    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully");
    info!("  Hadith API: {}", config.providers.hadith_base_url);
    info!("  Page images: {}", config.providers.page_image_base_url);
    info!("  Request timeout: {:?}", config.providers.request_timeout());
    info!("  Restart delay: {:?}", config.polling.restart_delay());
    info!("  Long poll: {}s", config.polling.long_poll_timeout_secs);

    let content = HttpContentClient::new(config.providers.clone())
        .context("Failed to build HTTP client")?;

    let bot = build_bot(&config.telegram.bot_token, &config.polling)?;
    let context = BotContext::new(Arc::new(content), Arc::new(bot.clone()));

    let driver = PollingDriver::new(
        TelegramPoller::new(bot, &config.polling),
        TokioPause,
        context,
        config.polling.restart_delay(),
    );

    tokio::select! {
        _ = driver.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
        }
    }

    Ok(())
}

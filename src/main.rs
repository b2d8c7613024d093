use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockwatch_agent::config::Config;
use stockwatch_agent::monitor::Monitor;
use stockwatch_agent::watchlist::JsonWatchlistStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockwatch_agent=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    if config.telegram.bot_token.is_empty() {
        anyhow::bail!("Missing required configuration: set TELEGRAM_BOT_TOKEN");
    }

    print_banner(&config);

    let store = Arc::new(JsonWatchlistStore::open(&config.watchlist_path).await?);
    info!("💾 Watchlist store ready at {}", config.watchlist_path);

    // Run the monitor (this blocks until Ctrl+C)
    let mut monitor = Monitor::new(config, store);
    monitor.run().await
}

fn print_banner(config: &Config) {
    println!("\n╔═══════════════════════════════════════════════════════════╗");
    println!("║            Stock Watchlist Agent with Gemini             ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!("📊 Watchlist file: {}", config.watchlist_path);
    println!(
        "⏱️  Monitor interval: {} seconds",
        config.agent.monitor_interval_secs
    );
    println!("🔔 Alert settings:");
    println!(
        "   • Cooldown: {} seconds per (symbol, kind)",
        config.alerts.cooldown_secs
    );
    println!(
        "   • History capacity: {} alerts",
        config.alerts.history_capacity
    );
    println!(
        "🤖 AI commentary: {}",
        if config.gemini.api_key.is_some() {
            "ENABLED"
        } else {
            "disabled (no GEMINI_API_KEY)"
        }
    );
    println!(
        "📱 Alert delivery: {}",
        if config.telegram.chat_id.is_some() {
            "ENABLED"
        } else {
            "commands only (no CHAT_ID)"
        }
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!("═══════════════════════════════════════════════════════════");
    println!();
}

use anyhow::Result;
use chrono::{Datelike, Local, Timelike};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::alerts::{
    check_portfolio_alerts, check_price_alerts, check_technical_alerts, Alert, AlertHistory,
};
use crate::bot::{Command, IncomingMessage, TelegramClient};
use crate::config::Config;
use crate::insights::InsightsClient;
use crate::market::{compute_snapshot, technical_report, HistoryClient, IndicatorSnapshot, QuoteClient};
use crate::watchlist::{PositionRecord, WatchlistStore};

pub struct Monitor {
    config: Config,
    store: Arc<dyn WatchlistStore>,
    quotes: QuoteClient,
    history: HistoryClient,
    telegram: Arc<TelegramClient>,
    insights: Option<InsightsClient>,
    alert_history: AlertHistory,
    command_rx: mpsc::UnboundedReceiver<IncomingMessage>,
}

impl Monitor {
    pub fn new(config: Config, store: Arc<dyn WatchlistStore>) -> Self {
        let quotes = QuoteClient::new(&config.market_data);
        let history = HistoryClient::new(&config.market_data);
        let insights = InsightsClient::from_config(&config.gemini);
        let telegram = Arc::new(TelegramClient::new(&config.telegram));

        let alert_history = AlertHistory::new(
            chrono::Duration::seconds(config.alerts.cooldown_secs),
            config.alerts.history_capacity,
        );

        // Inbound chat messages arrive over a channel from the long-poll
        // task, so the select loop below treats them like any other event.
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let listener = telegram.clone();
        tokio::spawn(async move {
            if let Err(e) = listener.listen(command_tx).await {
                error!("❌ Telegram listener error: {}", e);
            }
        });

        Self {
            config,
            store,
            quotes,
            history,
            telegram,
            insights,
            alert_history,
            command_rx,
        }
    }

    /// Main agent loop.
    pub async fn run(&mut self) -> Result<()> {
        info!("🚀 Starting Stock Watchlist Agent");
        info!(
            "⏱️  Monitor interval: {} seconds",
            self.config.agent.monitor_interval_secs
        );

        self.send_startup_notification().await;

        let mut monitor_interval = interval(Duration::from_secs(
            self.config.agent.monitor_interval_secs,
        ));

        // Deferred start, otherwise both would fire immediately on boot.
        let keepalive_period = Duration::from_secs(self.config.agent.keepalive_interval_secs);
        let mut keepalive_interval = interval_at(Instant::now() + keepalive_period, keepalive_period);
        let summary_period = Duration::from_secs(self.config.agent.daily_summary_interval_secs);
        let mut summary_interval = interval_at(Instant::now() + summary_period, summary_period);

        loop {
            tokio::select! {
                Some(message) = self.command_rx.recv() => {
                    self.handle_message(message).await;
                }

                _ = monitor_interval.tick() => {
                    if let Err(e) = self.run_monitor_cycle().await {
                        error!("❌ Error in monitoring cycle: {}", e);
                    }
                }

                _ = keepalive_interval.tick() => {
                    self.send_keepalive().await;
                }

                _ = summary_interval.tick() => {
                    if let Err(e) = self.send_daily_summary().await {
                        error!("❌ Error generating daily summary: {}", e);
                    }
                }
            }
        }
    }

    /// One monitoring tick: refresh quotes, evaluate every rule set, pass
    /// the candidates through dedup and deliver what survives. A failing
    /// symbol only loses its own alerts for this tick.
    async fn run_monitor_cycle(&mut self) -> Result<()> {
        info!("Starting stock monitoring cycle...");

        let records = self.store.get_all().await?;
        if records.is_empty() {
            info!("No stocks in watchlist");
            return Ok(());
        }
        info!("Monitoring {} stocks", records.len());

        let symbols: Vec<String> = records.iter().map(|r| r.symbol.clone()).collect();
        let prices = self.quotes.bulk_get_prices(&symbols).await;
        if !prices.is_empty() {
            let updated = self.store.bulk_update_prices(&prices).await?;
            info!("Updated prices for {} stocks", updated);
        }

        // Re-read so the evaluators see the refreshed prices.
        let records = self.store.get_all().await?;
        let mut candidates: Vec<Alert> = Vec::new();

        for record in &records {
            match check_price_alerts(record) {
                Ok(alerts) => candidates.extend(alerts),
                Err(e) => warn!("⚠️ Price evaluation failed for {}: {}", record.symbol, e),
            }

            match self.indicator_snapshot(&record.symbol).await {
                Ok(Some(snapshot)) => match check_technical_alerts(&record.symbol, &snapshot) {
                    Ok(alerts) => candidates.extend(alerts),
                    Err(e) => {
                        warn!("⚠️ Technical evaluation failed for {}: {}", record.symbol, e)
                    }
                },
                Ok(None) => debug!("Not enough history for {}", record.symbol),
                Err(e) => warn!("⚠️ Indicator data unavailable for {}: {}", record.symbol, e),
            }
        }

        match check_portfolio_alerts(&records) {
            Ok(alerts) => candidates.extend(alerts),
            Err(e) => warn!("⚠️ Portfolio evaluation failed: {}", e),
        }

        let delivered = self.alert_history.admit(candidates);
        if delivered.is_empty() {
            info!("No new alerts to send");
        } else {
            info!("Sending {} alerts", delivered.len());
            if let Some(chat_id) = self.config.telegram.chat_id.clone() {
                if let Err(e) = self.telegram.send_bulk_alerts(&chat_id, &delivered).await {
                    error!("❌ Failed to send alerts: {}", e);
                }
            }
        }

        info!(
            "Market status: {}",
            if self.is_market_hours() { "Open" } else { "Closed" }
        );
        Ok(())
    }

    async fn indicator_snapshot(&self, symbol: &str) -> Result<Option<IndicatorSnapshot>> {
        let closes = self.history.get_daily_closes(symbol).await?;
        compute_snapshot(&closes)
    }

    async fn handle_message(&mut self, message: IncomingMessage) {
        let Some(parsed) = Command::parse(&message.text) else {
            return;
        };
        let chat_id = message.chat_id.to_string();

        let reply = match parsed {
            Ok(command) => {
                debug!("Handling command {:?} from {}", command, chat_id);
                self.execute_command(command).await
            }
            Err(e) => e.to_string(),
        };

        if let Err(e) = self.telegram.send_message(&chat_id, &reply).await {
            error!("❌ Failed to reply to {}: {}", chat_id, e);
        }
    }

    async fn execute_command(&mut self, command: Command) -> String {
        match command {
            Command::Start => welcome_text(),
            Command::Help => help_text(),
            Command::AddStock {
                symbol,
                buy,
                target,
                stop,
                notes,
            } => self.add_stock(symbol, buy, target, stop, notes).await,
            Command::RemoveStock { symbol } => self.remove_stock(&symbol).await,
            Command::List => self.list_stocks().await,
            Command::Alerts => self.recent_alerts(),
            Command::Portfolio => self.portfolio_overview().await,
            Command::Insights { symbol } => self.stock_insights(&symbol).await,
            Command::BuyAdvice { symbol } => self.trade_advice(&symbol, "buy").await,
            Command::SellAdvice { symbol } => self.trade_advice(&symbol, "sell").await,
        }
    }

    async fn add_stock(
        &self,
        symbol: String,
        buy: f64,
        target: f64,
        stop: f64,
        notes: String,
    ) -> String {
        if target <= buy {
            return "❌ **Target price must be higher than buy price**".to_string();
        }
        if stop >= buy {
            return "❌ **Stop loss must be lower than buy price**".to_string();
        }
        if !self.quotes.validate_symbol(&symbol).await {
            return format!("❌ **Invalid stock symbol:** {}", symbol);
        }

        let record = PositionRecord::new(&symbol, buy, target, stop, notes.clone());
        if let Err(e) = self.store.add(record).await {
            return format!("❌ **Failed to add {}:** {}", symbol, e);
        }

        let current_price = self.quotes.get_price(&symbol).await.unwrap_or(0.0);
        if current_price > 0.0 {
            if let Err(e) = self.store.update_price(&symbol, current_price).await {
                warn!("⚠️ Failed to store current price for {}: {}", symbol, e);
            }
        }

        format!(
            "✅ **Added {} to watchlist!**\n\n\
             📊 **Details:**\n\
             • Buy Price: ${:.2}\n\
             • Target: ${:.2}\n\
             • Stop Loss: ${:.2}\n\
             • Current Price: ${:.2}\n\
             • Notes: {}\n\n\
             🤖 I'll monitor this stock and send alerts!",
            symbol, buy, target, stop, current_price, notes
        )
    }

    async fn remove_stock(&self, symbol: &str) -> String {
        let record = match self.store.get(symbol).await {
            Ok(Some(record)) => record,
            Ok(None) => return format!("❌ **{} not found** in your watchlist", symbol),
            Err(e) => return format!("❌ **Error:** {}", e),
        };

        match self.store.remove(symbol).await {
            Ok(true) => format!(
                "✅ **Removed {}** from watchlist\n\n\
                 📊 **Removed stock details:**\n\
                 • Buy Price: ${:.2}\n\
                 • Current Price: ${:.2}\n\
                 • Final P&L: {:.1}%",
                symbol,
                record.buy_price,
                record.current_price,
                record.pnl_percent()
            ),
            Ok(false) => format!("❌ **{} not found** in your watchlist", symbol),
            Err(e) => format!("❌ **Failed to remove {}:** {}", symbol, e),
        }
    }

    async fn list_stocks(&self) -> String {
        let records = match self.store.get_all().await {
            Ok(records) => records,
            Err(e) => return format!("❌ **Error:** {}", e),
        };

        if records.is_empty() {
            return "📋 **Your watchlist is empty**\n\n\
                    Add stocks using: `/add_stock SYMBOL buy=XX target=YY stop=ZZ`"
                .to_string();
        }

        let mut message = "📋 **Your Stock Watchlist**\n\n".to_string();
        for (i, record) in records.iter().enumerate() {
            let pnl = record.pnl_percent();
            let pnl_marker = if pnl >= 0.0 { "🟢" } else { "🔴" };
            let (target_distance, stop_distance) = if record.current_price > 0.0 {
                (
                    (record.target_price - record.current_price) / record.current_price * 100.0,
                    (record.current_price - record.stop_loss) / record.current_price * 100.0,
                )
            } else {
                (0.0, 0.0)
            };

            message.push_str(&format!(
                "**{}. {}** {}\n\
                 💰 Current: ${:.2} | P&L: {:+.1}%\n\
                 🎯 Target: ${:.2} ({:+.1}%)\n\
                 🛑 Stop: ${:.2} ({:+.1}%)\n\n",
                i + 1,
                record.symbol,
                pnl_marker,
                record.current_price,
                pnl,
                record.target_price,
                target_distance,
                record.stop_loss,
                stop_distance
            ));
        }
        message.trim_end().to_string()
    }

    fn recent_alerts(&self) -> String {
        let recent = self.alert_history.recent(10);
        if recent.is_empty() {
            return "📭 **No recent alerts**\n\n\
                    I'll notify you when:\n\
                    • Target prices are hit 🎯\n\
                    • Stop losses are triggered 🛑\n\
                    • Technical signals occur 📊"
                .to_string();
        }

        let mut message = "🔔 **Recent Alerts**\n\n".to_string();
        for alert in recent {
            let marker = match alert.priority {
                crate::alerts::Priority::Critical => "🚨",
                crate::alerts::Priority::High => "❗",
                crate::alerts::Priority::Medium => "⚠️",
                crate::alerts::Priority::Low => "ℹ️",
            };
            message.push_str(&format!(
                "{} **{}** - {}\n📅 {}\n\n",
                marker,
                alert.symbol,
                alert.kind.label(),
                alert.timestamp.format("%m/%d %H:%M")
            ));
        }
        message.trim_end().to_string()
    }

    async fn portfolio_overview(&self) -> String {
        let records = match self.store.get_all().await {
            Ok(records) => records,
            Err(e) => return format!("❌ **Error:** {}", e),
        };

        if records.is_empty() {
            return "📋 **Portfolio is empty** - Add some stocks first!".to_string();
        }

        let total_positions = records.len();
        let mut profitable = 0;
        let mut total_pnl = 0.0;
        let mut best: Option<(&PositionRecord, f64)> = None;
        let mut worst: Option<(&PositionRecord, f64)> = None;

        for record in &records {
            let pnl = record.pnl_percent();
            total_pnl += pnl;
            if pnl > 0.0 {
                profitable += 1;
            }
            if best.map_or(true, |(_, b)| pnl > b) {
                best = Some((record, pnl));
            }
            if worst.map_or(true, |(_, w)| pnl < w) {
                worst = Some((record, pnl));
            }
        }

        let avg_pnl = total_pnl / total_positions as f64;
        let win_rate = profitable as f64 / total_positions as f64 * 100.0;

        let mut message = format!(
            "📊 **Portfolio Overview**\n\
             📈 **Total Positions:** {}\n\n\
             📊 **Performance:**\n\
             • Average P&L: {:+.1}%\n\
             • Win Rate: {:.1}% ({}/{})\n",
            total_positions, avg_pnl, win_rate, profitable, total_positions
        );

        if let (Some((best_record, best_pnl)), Some((worst_record, worst_pnl))) = (best, worst) {
            message.push_str(&format!(
                "• Best: {} ({:+.1}%)\n• Worst: {} ({:+.1}%)\n",
                best_record.symbol, best_pnl, worst_record.symbol, worst_pnl
            ));
        }

        message.push_str("\n⚖️ **Risk Analysis:**\n");
        if avg_pnl < -5.0 {
            message.push_str(&format!(
                "🔴 High portfolio risk - Average loss {:.1}%\n",
                avg_pnl
            ));
        } else if avg_pnl > 5.0 {
            message.push_str(&format!(
                "🟢 Strong performance - Average gain {:.1}%\n",
                avg_pnl
            ));
        } else {
            message.push_str(&format!("🟡 Neutral performance - Average {:+.1}%\n", avg_pnl));
        }

        if win_rate < 40.0 {
            message.push_str("⚠️ Low win rate - Review strategy\n");
        } else if win_rate > 60.0 {
            message.push_str("✅ Good win rate - Strategy working\n");
        }

        if let Some(client) = &self.insights {
            match client.analyze_portfolio(&records).await {
                Ok(analysis) => {
                    message.push('\n');
                    message.push_str(&analysis);
                }
                Err(e) => warn!("⚠️ AI portfolio analysis failed: {}", e),
            }
        }

        message.trim_end().to_string()
    }

    async fn stock_insights(&self, symbol: &str) -> String {
        let snapshot = match self.indicator_snapshot(symbol).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                return "Unable to perform technical analysis - insufficient data.".to_string()
            }
            Err(e) => return format!("❌ **Error analyzing {}:** {}", symbol, e),
        };

        let report = technical_report(symbol, &snapshot);

        match &self.insights {
            Some(client) => match client.generate_stock_insight(symbol, &snapshot).await {
                Ok(insight) => format!("{}\n\n---\n\n{}", insight, report),
                Err(e) => {
                    warn!("⚠️ AI insight failed for {}: {}", symbol, e);
                    report
                }
            },
            None => report,
        }
    }

    async fn trade_advice(&self, symbol: &str, action: &str) -> String {
        let Some(client) = &self.insights else {
            return format!(
                "{} advice unavailable - AI not configured",
                capitalize(action)
            );
        };

        let snapshot = match self.indicator_snapshot(symbol).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                return "Unable to perform technical analysis - insufficient data.".to_string()
            }
            Err(e) => return format!("❌ **Error analyzing {}:** {}", symbol, e),
        };

        match client.get_buy_sell_advice(symbol, action, &snapshot).await {
            Ok(advice) => advice,
            Err(e) => format!("Error generating {} advice: {}", action, e),
        }
    }

    async fn send_startup_notification(&self) {
        let Some(chat_id) = self.config.telegram.chat_id.clone() else {
            return;
        };
        let stock_count = self.store.get_all().await.map(|r| r.len()).unwrap_or(0);

        let message = format!(
            "🤖 **Stock Watchlist Bot Started!**\n\n\
             📊 **Status:**\n\
             • Monitoring {} stocks\n\
             • Update interval: {} minutes\n\
             • Started at: {}\n\n\
             🔔 **Alerts enabled for:**\n\
             • Price targets & stop losses\n\
             • Technical analysis signals\n\
             • Portfolio performance\n\n\
             📱 Use `/help` for available commands",
            stock_count,
            self.config.agent.monitor_interval_secs / 60,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        if let Err(e) = self.telegram.send_message(&chat_id, &message).await {
            error!("❌ Failed to send startup notification: {}", e);
        }
    }

    async fn send_keepalive(&self) {
        let Some(chat_id) = self.config.telegram.chat_id.clone() else {
            return;
        };
        if !self.is_market_hours() {
            info!("Skipped keepalive ping (after market hours)");
            return;
        }

        let message = format!("🔄 System active - {}", Local::now().format("%H:%M"));
        match self.telegram.send_message(&chat_id, &message).await {
            Ok(()) => info!("Sent keepalive ping"),
            Err(e) => error!("❌ Failed to send keepalive ping: {}", e),
        }
    }

    async fn send_daily_summary(&self) -> Result<()> {
        let Some(chat_id) = self.config.telegram.chat_id.clone() else {
            return Ok(());
        };

        info!("Generating daily summary...");
        let records = self.store.get_all().await?;
        if records.is_empty() {
            return Ok(());
        }

        let total_positions = records.len();
        let profitable = records.iter().filter(|r| r.pnl_percent() > 0.0).count();

        let mut message = format!(
            "📊 **Daily Summary - {}**\n\n\
             📈 **Portfolio Status:**\n\
             • Total Positions: {}\n\
             • Profitable: {}/{}\n\
             • Win Rate: {:.1}%\n\n",
            Local::now().format("%m/%d/%Y"),
            total_positions,
            profitable,
            total_positions,
            profitable as f64 / total_positions as f64 * 100.0
        );

        let mut ranked: Vec<&PositionRecord> = records.iter().collect();
        ranked.sort_by(|a, b| {
            b.pnl_percent()
                .partial_cmp(&a.pnl_percent())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let (Some(best), Some(worst)) = (ranked.first(), ranked.last()) {
            message.push_str(&format!(
                "🏆 **Best Performer:** {} ({:+.1}%)\n\
                 📉 **Worst Performer:** {} ({:+.1}%)\n\n",
                best.symbol,
                best.pnl_percent(),
                worst.symbol,
                worst.pnl_percent()
            ));
        }

        message.push_str(
            "🤖 **AI Insights:** Use `/portfolio` for detailed analysis\n\
             📱 **Commands:** `/list` to view all positions",
        );

        self.telegram.send_message(&chat_id, &message).await
    }

    fn is_market_hours(&self) -> bool {
        let now = Local::now();
        if now.weekday().num_days_from_monday() >= 5 {
            return false;
        }
        let hour = now.hour();
        hour >= self.config.agent.market_open_hour && hour <= self.config.agent.market_close_hour
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn welcome_text() -> String {
    "🤖 **Stock Watchlist AI Assistant**\n\n\
     Welcome! I help you track stocks and provide AI-powered insights.\n\n\
     **Available Commands:**\n\
     • `/add_stock SYMBOL buy=XX target=YY stop=ZZ notes=TEXT` - Add stock to watchlist\n\
     • `/remove_stock SYMBOL` - Remove stock from watchlist\n\
     • `/list` - Show your watchlist with current prices\n\
     • `/insights SYMBOL` - Get AI analysis and recommendations\n\
     • `/alerts` - Show recent alerts\n\
     • `/portfolio` - Portfolio overview and analysis\n\n\
     **Example:**\n\
     `/add_stock AAPL buy=150 target=180 stop=140 notes=Tech giant`\n\n\
     Let's start building your watchlist! 📈"
        .to_string()
}

fn help_text() -> String {
    "📚 **Help - Stock Watchlist Commands**\n\n\
     **Stock Management:**\n\
     • `/add_stock SYMBOL buy=XX target=YY stop=ZZ notes=TEXT`\n\
       Example: `/add_stock TSLA buy=200 target=250 stop=180 notes=EV leader`\n\
     • `/remove_stock SYMBOL`\n\
     • `/list` - View all stocks in watchlist\n\n\
     **Analysis & Insights:**\n\
     • `/insights SYMBOL` - AI-powered analysis\n\
     • `/buy_advice SYMBOL` - AI recommendation for buying\n\
     • `/sell_advice SYMBOL` - AI recommendation for selling\n\
     • `/alerts` - Recent price and technical alerts\n\
     • `/portfolio` - Portfolio performance overview\n\n\
     **Automated Features:**\n\
     • Price updates every monitoring cycle\n\
     • Automatic alerts when targets/stop-losses hit\n\
     • Technical analysis alerts (RSI, MACD, etc.)\n\
     • AI insights combining technical data\n\n\
     Need help? Just ask! 🚀"
        .to_string()
}

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub gemini: GeminiConfig,
    pub agent: AgentConfig,
    pub alerts: AlertConfig,
    pub market_data: MarketDataConfig,
    pub watchlist_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: Option<String>,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub monitor_interval_secs: u64,
    pub keepalive_interval_secs: u64,
    pub daily_summary_interval_secs: u64,
    pub market_open_hour: u32,
    pub market_close_hour: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertConfig {
    pub cooldown_secs: i64,
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketDataConfig {
    pub nse_quote_url: String,
    pub yahoo_chart_url: String,
    pub quote_cache_secs: u64,
    pub history_range: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let telegram = TelegramConfig {
            bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            chat_id: env::var("CHAT_ID").ok(),
            poll_timeout_secs: env::var("TELEGRAM_POLL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        };

        let gemini = GeminiConfig {
            api_key: env::var("GEMINI_API_KEY").ok(),
            model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
        };

        let agent = AgentConfig {
            monitor_interval_secs: env::var("MONITOR_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            keepalive_interval_secs: env::var("KEEPALIVE_INTERVAL_SECS")
                .unwrap_or_else(|_| "840".to_string())
                .parse()
                .unwrap_or(840),
            daily_summary_interval_secs: env::var("DAILY_SUMMARY_INTERVAL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86400),
            market_open_hour: env::var("MARKET_OPEN_HOUR")
                .unwrap_or_else(|_| "9".to_string())
                .parse()
                .unwrap_or(9),
            market_close_hour: env::var("MARKET_CLOSE_HOUR")
                .unwrap_or_else(|_| "16".to_string())
                .parse()
                .unwrap_or(16),
        };

        let alerts = AlertConfig {
            cooldown_secs: env::var("ALERT_COOLDOWN_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),
            history_capacity: env::var("ALERT_HISTORY_CAPACITY")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
        };

        let market_data = MarketDataConfig {
            nse_quote_url: env::var("NSE_QUOTE_URL")
                .unwrap_or_else(|_| "https://www.nseindia.com/api/quote-equity".to_string()),
            yahoo_chart_url: env::var("YAHOO_CHART_URL")
                .unwrap_or_else(|_| "https://query1.finance.yahoo.com/v8/finance/chart".to_string()),
            quote_cache_secs: env::var("QUOTE_CACHE_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            history_range: env::var("HISTORY_RANGE")
                .unwrap_or_else(|_| "3mo".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        };

        let watchlist_path = env::var("WATCHLIST_PATH")
            .unwrap_or_else(|_| "watchlist.json".to_string());

        Ok(Config {
            telegram,
            gemini,
            agent,
            alerts,
            market_data,
            watchlist_path,
        })
    }
}

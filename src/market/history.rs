use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::MarketDataConfig;
use crate::market::quotes::normalize_symbol;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Daily-close history source backing the indicator engine.
pub struct HistoryClient {
    http_client: Client,
    yahoo_chart_url: String,
    range: String,
}

impl HistoryClient {
    pub fn new(config: &MarketDataConfig) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            yahoo_chart_url: config.yahoo_chart_url.clone(),
            range: config.history_range.clone(),
        }
    }

    /// Daily closes, oldest first. Sessions without a close (holidays,
    /// suspensions) are dropped rather than interpolated.
    pub async fn get_daily_closes(&self, symbol: &str) -> Result<Vec<f64>> {
        let symbol = normalize_symbol(symbol);
        let url = format!(
            "{}/{}.NS?range={}&interval=1d",
            self.yahoo_chart_url, symbol, self.range
        );

        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("chart API returned status {}", response.status());
        }

        let data: ChartResponse = response.json().await?;
        let closes: Vec<f64> = data
            .chart
            .result
            .and_then(|mut results| results.pop())
            .and_then(|result| result.indicators.quote.into_iter().next())
            .ok_or_else(|| anyhow!("no quote series for {}", symbol))?
            .close
            .into_iter()
            .flatten()
            .collect();

        debug!("📈 History: {} closes for {}", closes.len(), symbol);
        Ok(closes)
    }
}

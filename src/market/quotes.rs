use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::MarketDataConfig;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

#[derive(Debug, Deserialize)]
struct NseQuoteResponse {
    #[serde(rename = "priceInfo")]
    price_info: NsePriceInfo,
}

#[derive(Debug, Deserialize)]
struct NsePriceInfo {
    #[serde(rename = "lastPrice")]
    last_price: f64,
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    meta: YahooMeta,
}

#[derive(Debug, Deserialize)]
struct YahooMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Clone)]
struct CachedQuote {
    price: f64,
    timestamp: Instant,
}

/// Spot-price source with an NSE primary and a Yahoo chart fallback,
/// fronted by a short in-process cache.
pub struct QuoteClient {
    http_client: Client,
    nse_quote_url: String,
    yahoo_chart_url: String,
    cache_duration: Duration,
    cache: RwLock<HashMap<String, CachedQuote>>,
}

/// Uppercase and strip exchange suffixes, "reliance.ns" -> "RELIANCE".
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .to_uppercase()
        .replace(".NS", "")
        .replace(".BO", "")
}

impl QuoteClient {
    pub fn new(config: &MarketDataConfig) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            nse_quote_url: config.nse_quote_url.clone(),
            yahoo_chart_url: config.yahoo_chart_url.clone(),
            cache_duration: Duration::from_secs(config.quote_cache_secs),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_price(&self, symbol: &str) -> Result<f64> {
        let symbol = normalize_symbol(symbol);

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&symbol) {
                if cached.timestamp.elapsed() < self.cache_duration {
                    return Ok(cached.price);
                }
            }
        }

        let price = match self.fetch_nse(&symbol).await {
            Ok(price) => {
                info!("NSE: {} = {:.2}", symbol, price);
                price
            }
            Err(e) => {
                debug!("NSE failed for {}: {}", symbol, e);
                let price = self.fetch_yahoo(&symbol).await?;
                info!("Yahoo: {} = {:.2}", symbol, price);
                price
            }
        };

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                symbol,
                CachedQuote {
                    price,
                    timestamp: Instant::now(),
                },
            );
        }

        Ok(price)
    }

    /// Fetch prices for a whole batch, skipping symbols every source fails
    /// on. A short pause between symbols keeps the sources happy.
    pub async fn bulk_get_prices(&self, symbols: &[String]) -> HashMap<String, f64> {
        let mut prices = HashMap::new();
        for symbol in symbols {
            match self.get_price(symbol).await {
                Ok(price) => {
                    prices.insert(normalize_symbol(symbol), price);
                }
                Err(e) => {
                    warn!("⚠️ All quote sources failed for {}: {}", symbol, e);
                }
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        prices
    }

    /// A symbol is valid when at least one source resolves it to a price.
    pub async fn validate_symbol(&self, symbol: &str) -> bool {
        self.get_price(symbol).await.is_ok()
    }

    async fn fetch_nse(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}?symbol={}", self.nse_quote_url, symbol);
        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header(
                "Referer",
                format!(
                    "https://www.nseindia.com/get-quotes/equity?symbol={}",
                    symbol
                ),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("NSE API returned status {}", response.status());
        }

        let data: NseQuoteResponse = response.json().await?;
        Ok(data.price_info.last_price)
    }

    async fn fetch_yahoo(&self, symbol: &str) -> Result<f64> {
        let url = format!(
            "{}/{}.NS?range=1d&interval=1d",
            self.yahoo_chart_url, symbol
        );
        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Yahoo chart API returned status {}", response.status());
        }

        let data: YahooChartResponse = response.json().await?;
        data.chart
            .result
            .and_then(|mut results| results.pop())
            .and_then(|result| result.meta.regular_market_price)
            .ok_or_else(|| anyhow::anyhow!("no market price in Yahoo response for {}", symbol))
    }
}

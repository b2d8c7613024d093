use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::GeminiConfig;
use crate::market::IndicatorSnapshot;
use crate::watchlist::PositionRecord;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini-backed commentary. Entirely optional: without an API key the
/// constructor yields `None` and callers fall back to plain reports.
pub struct InsightsClient {
    http_client: Client,
    api_key: String,
    model: String,
}

impl InsightsClient {
    pub fn from_config(config: &GeminiConfig) -> Option<Self> {
        let Some(api_key) = config.api_key.clone() else {
            warn!("🤖 Gemini AI: not configured, insights disabled");
            return None;
        };
        info!("🤖 Gemini AI: configured ({})", config.model);
        Some(Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub async fn generate_stock_insight(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
    ) -> Result<String> {
        let tech_summary = format_technical_summary(snapshot);

        let prompt = format!(
            "You are a professional stock market assistant with expertise in technical \
             analysis and market sentiment.\n\n\
             Analyze the stock: {}\n\n\
             Technical Indicators Summary:\n{}\n\n\
             Provide a concise actionable insight (maximum 4 lines):\n\
             - Clear Buy/Sell/Hold recommendation with confidence level\n\
             - Primary reason combining technical patterns and market sentiment\n\
             - Short-term outlook (next 1-2 weeks)\n\
             - One key risk or opportunity to watch\n\n\
             Keep it professional, actionable, and under 200 words.",
            symbol.to_uppercase(),
            tech_summary
        );

        let insight = self.generate(&prompt).await?;
        info!("Generated AI insight for {}", symbol);
        Ok(format!("🤖 AI Insight for {}:\n\n{}", symbol, insight))
    }

    pub async fn analyze_portfolio(&self, records: &[PositionRecord]) -> Result<String> {
        let mut lines = Vec::new();
        let mut winners = 0;
        let mut losers = 0;

        for record in records {
            if record.buy_price > 0.0 && record.current_price > 0.0 {
                let pnl = record.pnl_percent();
                lines.push(format!("{}: {:+.1}%", record.symbol, pnl));
                if pnl > 0.0 {
                    winners += 1;
                } else {
                    losers += 1;
                }
            }
        }

        let prompt = format!(
            "You are a portfolio manager analyzing a stock watchlist.\n\n\
             Portfolio Performance:\n{}\n\n\
             Winners: {} stocks\nLosers: {} stocks\n\n\
             Provide a brief portfolio analysis (maximum 5 lines):\n\
             - Overall portfolio health assessment\n\
             - Sector diversification comment if patterns visible\n\
             - Risk management observation\n\
             - One actionable recommendation for the portfolio\n\n\
             Keep it concise and actionable.",
            lines.join("\n"),
            winners,
            losers
        );

        let analysis = self.generate(&prompt).await?;
        Ok(format!("📊 Portfolio Analysis:\n\n{}", analysis))
    }

    pub async fn get_buy_sell_advice(
        &self,
        symbol: &str,
        action: &str,
        snapshot: &IndicatorSnapshot,
    ) -> Result<String> {
        let tech_summary = format_technical_summary(snapshot);
        let action_upper = action.to_uppercase();
        let mut action_title = action_upper.clone();
        if let Some(rest) = action_title.get_mut(1..) {
            rest.make_ascii_lowercase();
        }

        let prompt = format!(
            "You are a trading advisor. A trader wants specific {} advice for {}.\n\n\
             Current Technical Status:\n{}\n\n\
             Provide focused {} advice (maximum 3 lines):\n\
             - Should they {} now? (Yes/No with confidence %)\n\
             - Best {} strategy (timing, price levels)\n\
             - Key factor supporting your {} recommendation\n\n\
             Be direct and actionable.",
            action_upper,
            symbol.to_uppercase(),
            tech_summary,
            action,
            action,
            action,
            action
        );

        let advice = self.generate(&prompt).await?;
        Ok(format!("💡 {} Advice for {}:\n\n{}", action_title, symbol, advice))
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_URL, self.model, self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Gemini API returned status {}", response.status());
        }

        let data: GenerateContentResponse = response.json().await?;
        data.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|t| t.trim().to_string())
            .ok_or_else(|| anyhow!("empty Gemini response"))
    }
}

/// One-line indicator digest fed into the prompts.
fn format_technical_summary(snapshot: &IndicatorSnapshot) -> String {
    let mut summary = Vec::new();

    if snapshot.rsi < 30.0 {
        summary.push(format!("RSI: {:.1} (Oversold)", snapshot.rsi));
    } else if snapshot.rsi > 70.0 {
        summary.push(format!("RSI: {:.1} (Overbought)", snapshot.rsi));
    } else {
        summary.push(format!("RSI: {:.1} (Neutral)", snapshot.rsi));
    }

    if snapshot.macd > snapshot.macd_signal {
        summary.push("MACD: Bullish crossover".to_string());
    } else {
        summary.push("MACD: Bearish crossover".to_string());
    }

    if snapshot.bollinger_position > 0.8 {
        summary.push("Bollinger Bands: Near upper band".to_string());
    } else if snapshot.bollinger_position < 0.2 {
        summary.push("Bollinger Bands: Near lower band".to_string());
    } else {
        summary.push("Bollinger Bands: Middle range".to_string());
    }

    if snapshot.ema_50 > snapshot.ema_200 {
        summary.push("EMA: Golden cross (50 > 200)".to_string());
    } else {
        summary.push("EMA: Death cross (50 < 200)".to_string());
    }

    summary.join(" | ")
}

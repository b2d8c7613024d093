use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One watched position. Symbols are stored uppercase; `current_price`
/// starts at 0.0 and is refreshed by the quote feed each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    pub symbol: String,
    pub buy_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub current_price: f64,
    #[serde(default)]
    pub notes: String,
    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl PositionRecord {
    pub fn new(
        symbol: impl Into<String>,
        buy_price: f64,
        target_price: f64,
        stop_loss: f64,
        notes: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            symbol: symbol.into().to_uppercase(),
            buy_price,
            target_price,
            stop_loss,
            current_price: 0.0,
            notes: notes.into(),
            date_added: now,
            last_updated: now,
        }
    }

    /// P&L percentage against the buy price, 0.0 while either price is unset.
    pub fn pnl_percent(&self) -> f64 {
        if self.buy_price > 0.0 && self.current_price > 0.0 {
            (self.current_price - self.buy_price) / self.buy_price * 100.0
        } else {
            0.0
        }
    }
}

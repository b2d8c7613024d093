use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of alert kinds. Portfolio-level alerts are first-class
/// variants, not ad-hoc tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    TargetHit,
    StopLoss,
    TechnicalBuy,
    TechnicalSell,
    PortfolioLoss,
    LowWinrate,
}

impl AlertKind {
    /// Human-readable label used in summaries ("target_hit" -> "Target Hit").
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::TargetHit => "Target Hit",
            AlertKind::StopLoss => "Stop Loss",
            AlertKind::TechnicalBuy => "Technical Buy",
            AlertKind::TechnicalSell => "Technical Sell",
            AlertKind::PortfolioLoss => "Portfolio Loss",
            AlertKind::LowWinrate => "Low Winrate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub symbol: String,
    pub message: String,
    pub trigger_value: f64,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        symbol: impl Into<String>,
        message: String,
        trigger_value: f64,
        priority: Priority,
    ) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            message,
            trigger_value,
            priority,
            timestamp: Utc::now(),
        }
    }
}

/// Evaluation failure, distinct from "no signal" (`Ok(vec![])`).
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("non-finite {field} for {symbol}")]
    NonFinite { symbol: String, field: &'static str },
}

/// Inputs are validated before any rule runs, so an `Err` never leaves a
/// partially evaluated alert batch behind.
pub(crate) fn ensure_finite(symbol: &str, field: &'static str, value: f64) -> Result<(), EvalError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EvalError::NonFinite {
            symbol: symbol.to_string(),
            field,
        })
    }
}

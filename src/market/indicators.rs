use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use ta::indicators::{
    BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex,
};
use ta::Next;

/// Closes required before a snapshot is produced at all.
const MIN_HISTORY: usize = 50;

const RSI_PERIOD: usize = 14;
const EMA_SHORT_PERIOD: usize = 50;
const EMA_LONG_PERIOD: usize = 200;
const BB_PERIOD: usize = 20;
const BB_STD_DEV: f64 = 2.0;

/// Point-in-time indicator bundle for one symbol, recomputed fresh each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    /// Normalized location between the Bollinger bands, 0 = lower, 1 = upper.
    pub bollinger_position: f64,
    pub ema_50: f64,
    pub ema_200: f64,
    pub current_price: f64,
}

/// Compute a snapshot from a daily-close series, oldest first.
///
/// Returns `Ok(None)` when there is not enough history; that is the normal
/// case for recently listed symbols and produces no technical alerts.
/// The long EMA window shrinks to the series length when shorter than 200.
pub fn compute_snapshot(closes: &[f64]) -> Result<Option<IndicatorSnapshot>> {
    if closes.len() < MIN_HISTORY {
        return Ok(None);
    }
    let Some(&last_close) = closes.last() else {
        return Ok(None);
    };

    let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD)
        .map_err(|e| anyhow!("RSI init failed: {:?}", e))?;
    let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9)
        .map_err(|e| anyhow!("MACD init failed: {:?}", e))?;
    let mut bb = BollingerBands::new(BB_PERIOD, BB_STD_DEV)
        .map_err(|e| anyhow!("Bollinger init failed: {:?}", e))?;
    let mut ema_short = ExponentialMovingAverage::new(EMA_SHORT_PERIOD)
        .map_err(|e| anyhow!("EMA50 init failed: {:?}", e))?;
    let mut ema_long = ExponentialMovingAverage::new(EMA_LONG_PERIOD.min(closes.len()))
        .map_err(|e| anyhow!("EMA200 init failed: {:?}", e))?;

    let mut rsi_value = 0.0;
    let mut macd_out = (0.0, 0.0, 0.0);
    let mut bb_out = (0.0, 0.0);
    let mut ema_50 = 0.0;
    let mut ema_200 = 0.0;

    for &close in closes {
        rsi_value = rsi.next(close);
        let m = macd.next(close);
        macd_out = (m.macd, m.signal, m.histogram);
        let b = bb.next(close);
        bb_out = (b.lower, b.upper);
        ema_50 = ema_short.next(close);
        ema_200 = ema_long.next(close);
    }

    let (bb_lower, bb_upper) = bb_out;
    let band_width = bb_upper - bb_lower;
    let bollinger_position = if band_width > 0.0 {
        (last_close - bb_lower) / band_width
    } else {
        0.5
    };

    Ok(Some(IndicatorSnapshot {
        rsi: rsi_value,
        macd: macd_out.0,
        macd_signal: macd_out.1,
        macd_histogram: macd_out.2,
        bollinger_position,
        ema_50,
        ema_200,
        current_price: last_close,
    }))
}

/// Per-symbol technical report with a rough buy/sell/hold call from a
/// majority vote over the individual signals.
pub fn technical_report(symbol: &str, snapshot: &IndicatorSnapshot) -> String {
    let mut signals: Vec<String> = Vec::new();
    let mut buy_count = 0;
    let mut sell_count = 0;

    if snapshot.rsi < 30.0 {
        signals.push("RSI: OVERSOLD (Buy)".to_string());
        buy_count += 1;
    } else if snapshot.rsi > 70.0 {
        signals.push("RSI: OVERBOUGHT (Sell)".to_string());
        sell_count += 1;
    } else {
        signals.push(format!("RSI: NEUTRAL ({:.1})", snapshot.rsi));
    }

    if snapshot.macd > snapshot.macd_signal {
        signals.push("MACD: BULLISH".to_string());
        buy_count += 1;
    } else {
        signals.push("MACD: BEARISH".to_string());
        sell_count += 1;
    }

    if snapshot.bollinger_position > 0.8 {
        signals.push("Bollinger: UPPER BAND (Sell)".to_string());
        sell_count += 1;
    } else if snapshot.bollinger_position < 0.2 {
        signals.push("Bollinger: LOWER BAND (Buy)".to_string());
        buy_count += 1;
    } else {
        signals.push("Bollinger: MIDDLE RANGE".to_string());
    }

    if snapshot.ema_50 > snapshot.ema_200 {
        signals.push("EMA: GOLDEN CROSS (Buy)".to_string());
        buy_count += 1;
    } else {
        signals.push("EMA: DEATH CROSS (Sell)".to_string());
        sell_count += 1;
    }

    let mut report = format!(
        "📊 **{} Analysis**\n💰 Price: ${:.2}\n\n",
        symbol, snapshot.current_price
    );
    for signal in &signals {
        report.push_str(&format!("• {}\n", signal));
    }

    let verdict = if buy_count > sell_count {
        format!("🟢 **BUY** ({} vs {})", buy_count, sell_count)
    } else if sell_count > buy_count {
        format!("🔴 **SELL** ({} vs {})", sell_count, buy_count)
    } else {
        "🟡 **HOLD** (Mixed signals)".to_string()
    };
    report.push('\n');
    report.push_str(&verdict);

    report
}

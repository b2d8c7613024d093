use crate::alerts::types::{ensure_finite, Alert, AlertKind, EvalError, Priority};
use crate::market::IndicatorSnapshot;

const RSI_OVERSOLD: f64 = 25.0;
const RSI_OVERBOUGHT: f64 = 75.0;
const MACD_PROXIMITY: f64 = 0.1;
const BB_LOWER_BAND: f64 = 0.05;
const BB_UPPER_BAND: f64 = 0.95;
const GOLDEN_CROSS_GAP: f64 = 0.02;

/// Evaluate indicator rules for one symbol. All rules fire independently,
/// so a single snapshot can produce several alerts.
///
/// The MACD rule flags proximity of the two lines while MACD is above the
/// signal, not a sign change between ticks; the golden-cross rule likewise
/// infers recency from the EMAs still being close together. No prior-tick
/// state is consulted.
pub fn check_technical_alerts(
    symbol: &str,
    snapshot: &IndicatorSnapshot,
) -> Result<Vec<Alert>, EvalError> {
    ensure_finite(symbol, "rsi", snapshot.rsi)?;
    ensure_finite(symbol, "macd", snapshot.macd)?;
    ensure_finite(symbol, "macd_signal", snapshot.macd_signal)?;
    ensure_finite(symbol, "bollinger_position", snapshot.bollinger_position)?;
    ensure_finite(symbol, "ema_50", snapshot.ema_50)?;
    ensure_finite(symbol, "ema_200", snapshot.ema_200)?;

    let mut alerts = Vec::new();

    let rsi = snapshot.rsi;
    if rsi <= RSI_OVERSOLD {
        alerts.push(Alert::new(
            AlertKind::TechnicalBuy,
            symbol,
            format!(
                "📊 TECHNICAL BUY SIGNAL: {}\n\
                 🔴 RSI: {:.1} (Severely Oversold)\n\
                 💡 Potential bounce opportunity",
                symbol, rsi
            ),
            rsi,
            Priority::High,
        ));
    } else if rsi >= RSI_OVERBOUGHT {
        alerts.push(Alert::new(
            AlertKind::TechnicalSell,
            symbol,
            format!(
                "📊 TECHNICAL SELL SIGNAL: {}\n\
                 🔴 RSI: {:.1} (Severely Overbought)\n\
                 ⚠️ Correction may be imminent",
                symbol, rsi
            ),
            rsi,
            Priority::High,
        ));
    }

    let macd_gap = snapshot.macd - snapshot.macd_signal;
    if snapshot.macd > snapshot.macd_signal && macd_gap.abs() < MACD_PROXIMITY {
        alerts.push(Alert::new(
            AlertKind::TechnicalBuy,
            symbol,
            format!(
                "📊 MACD BULLISH CROSSOVER: {}\n\
                 📈 MACD crossed above signal line\n\
                 💡 Potential uptrend beginning",
                symbol
            ),
            macd_gap,
            Priority::Medium,
        ));
    }

    let bb = snapshot.bollinger_position;
    if bb <= BB_LOWER_BAND {
        alerts.push(Alert::new(
            AlertKind::TechnicalBuy,
            symbol,
            format!(
                "📊 BOLLINGER BAND SQUEEZE: {}\n\
                 📉 Price at lower Bollinger Band\n\
                 💡 Potential reversal opportunity",
                symbol
            ),
            bb,
            Priority::Medium,
        ));
    } else if bb >= BB_UPPER_BAND {
        alerts.push(Alert::new(
            AlertKind::TechnicalSell,
            symbol,
            format!(
                "📊 BOLLINGER BAND EXTENSION: {}\n\
                 📈 Price at upper Bollinger Band\n\
                 ⚠️ Potential pullback ahead",
                symbol
            ),
            bb,
            Priority::Medium,
        ));
    }

    if snapshot.ema_50 > snapshot.ema_200 && snapshot.ema_200 > 0.0 {
        let relative_gap = (snapshot.ema_50 - snapshot.ema_200) / snapshot.ema_200;
        if relative_gap < GOLDEN_CROSS_GAP {
            alerts.push(Alert::new(
                AlertKind::TechnicalBuy,
                symbol,
                format!(
                    "📊 GOLDEN CROSS DETECTED: {}\n\
                     🌟 50 EMA crossed above 200 EMA\n\
                     📈 Long-term bullish signal",
                    symbol
                ),
                relative_gap,
                Priority::High,
            ));
        }
    }

    Ok(alerts)
}

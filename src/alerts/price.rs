use crate::alerts::types::{ensure_finite, Alert, AlertKind, EvalError, Priority};
use crate::watchlist::PositionRecord;

/// Band around target/stop treated as "approaching" (5%).
const APPROACH_BAND: f64 = 0.05;

/// Evaluate target/stop-loss rules for one position.
///
/// The hit checks are exclusive with each other, and so are the two
/// approaching checks; a hit on one side does not suppress the approaching
/// check on the same side because that comparison is already false.
/// Records with any unset price field produce no alerts.
pub fn check_price_alerts(record: &PositionRecord) -> Result<Vec<Alert>, EvalError> {
    let symbol = record.symbol.as_str();
    ensure_finite(symbol, "current_price", record.current_price)?;
    ensure_finite(symbol, "target_price", record.target_price)?;
    ensure_finite(symbol, "stop_loss", record.stop_loss)?;
    ensure_finite(symbol, "buy_price", record.buy_price)?;

    let mut alerts = Vec::new();

    let current = record.current_price;
    let target = record.target_price;
    let stop = record.stop_loss;
    let buy = record.buy_price;

    // Incomplete data, not an error.
    if current == 0.0 || target == 0.0 || stop == 0.0 || buy == 0.0 {
        return Ok(alerts);
    }

    if current >= target {
        let profit_percent = (current - buy) / buy * 100.0;
        alerts.push(Alert::new(
            AlertKind::TargetHit,
            symbol,
            format!(
                "🎯 TARGET HIT: {} reached ${:.2} (Target: ${:.2})\n\
                 💰 Profit: +{:.1}%\n\
                 💡 Consider taking profits or adjusting stop-loss",
                symbol, current, target, profit_percent
            ),
            target,
            Priority::High,
        ));
    } else if current <= stop {
        let loss_percent = (current - buy) / buy * 100.0;
        alerts.push(Alert::new(
            AlertKind::StopLoss,
            symbol,
            format!(
                "🛑 STOP LOSS HIT: {} dropped to ${:.2} (Stop: ${:.2})\n\
                 📉 Loss: {:.1}%\n\
                 ⚠️ Consider exiting position to limit losses",
                symbol, current, stop, loss_percent
            ),
            stop,
            Priority::Critical,
        ));
    }

    let target_buffer = target * (1.0 - APPROACH_BAND);
    let stop_buffer = stop * (1.0 + APPROACH_BAND);

    if target_buffer <= current && current < target {
        alerts.push(Alert::new(
            AlertKind::TargetHit,
            symbol,
            format!(
                "📈 APPROACHING TARGET: {} at ${:.2}\n\
                 🎯 Target: ${:.2} (95% reached)\n\
                 💡 Monitor closely for exit opportunity",
                symbol, current, target
            ),
            target_buffer,
            Priority::Medium,
        ));
    } else if stop < current && current <= stop_buffer {
        alerts.push(Alert::new(
            AlertKind::StopLoss,
            symbol,
            format!(
                "⚠️ APPROACHING STOP LOSS: {} at ${:.2}\n\
                 🛑 Stop Loss: ${:.2}\n\
                 📊 Consider technical analysis for trend reversal",
                symbol, current, stop
            ),
            stop_buffer,
            Priority::Medium,
        ));
    }

    Ok(alerts)
}

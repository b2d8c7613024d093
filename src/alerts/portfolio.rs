use crate::alerts::types::{ensure_finite, Alert, AlertKind, EvalError, Priority};
use crate::watchlist::PositionRecord;

const AVG_LOSS_THRESHOLD: f64 = -10.0;
const LOW_WINRATE_THRESHOLD: f64 = 30.0;

/// Evaluate portfolio-wide performance over the full watchlist.
///
/// At most one alert comes out: a portfolio-loss alert wins over a
/// low-win-rate alert. The average P&L is taken over records with usable
/// prices; the win rate denominator deliberately counts every record,
/// including skipped ones, so the two can disagree.
pub fn check_portfolio_alerts(records: &[PositionRecord]) -> Result<Vec<Alert>, EvalError> {
    let mut alerts = Vec::new();
    if records.is_empty() {
        return Ok(alerts);
    }

    for record in records {
        ensure_finite(&record.symbol, "buy_price", record.buy_price)?;
        ensure_finite(&record.symbol, "current_price", record.current_price)?;
    }

    let total_positions = records.len();
    let mut profitable_positions = 0usize;
    let mut valid_positions = 0usize;
    let mut total_pnl = 0.0;

    for record in records {
        if record.buy_price > 0.0 && record.current_price > 0.0 {
            let pnl_percent = (record.current_price - record.buy_price) / record.buy_price * 100.0;
            total_pnl += pnl_percent;
            valid_positions += 1;
            if pnl_percent > 0.0 {
                profitable_positions += 1;
            }
        }
    }

    let avg_pnl = if valid_positions > 0 {
        total_pnl / valid_positions as f64
    } else {
        0.0
    };
    let win_rate = profitable_positions as f64 / total_positions as f64 * 100.0;

    if avg_pnl <= AVG_LOSS_THRESHOLD {
        alerts.push(Alert::new(
            AlertKind::PortfolioLoss,
            "PORTFOLIO",
            format!(
                "📉 **PORTFOLIO ALERT**\n\
                 Average Loss: {:.1}%\n\
                 Win Rate: {:.1}%\n\
                 🔍 Review positions for risk management",
                avg_pnl, win_rate
            ),
            avg_pnl,
            Priority::High,
        ));
    } else if win_rate < LOW_WINRATE_THRESHOLD {
        alerts.push(Alert::new(
            AlertKind::LowWinrate,
            "PORTFOLIO",
            format!(
                "⚠️ **LOW WIN RATE ALERT**\n\
                 Win Rate: {:.1}%\n\
                 Profitable: {}/{}\n\
                 💡 Consider strategy review",
                win_rate, profitable_positions, total_positions
            ),
            win_rate,
            Priority::Medium,
        ));
    }

    Ok(alerts)
}

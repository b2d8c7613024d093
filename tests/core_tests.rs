use chrono::{DateTime, Duration, TimeZone, Utc};
use stockwatch_agent::alerts::{
    check_portfolio_alerts, check_price_alerts, check_technical_alerts, format_alert,
    format_summary, Alert, AlertHistory, AlertKind, Priority,
};
use stockwatch_agent::market::IndicatorSnapshot;
use stockwatch_agent::watchlist::PositionRecord;

fn record(symbol: &str, buy: f64, target: f64, stop: f64, current: f64) -> PositionRecord {
    let mut record = PositionRecord::new(symbol, buy, target, stop, "");
    record.current_price = current;
    record
}

fn neutral_snapshot() -> IndicatorSnapshot {
    IndicatorSnapshot {
        rsi: 50.0,
        macd: 1.0,
        macd_signal: 0.5,
        macd_histogram: 0.5,
        bollinger_position: 0.5,
        ema_50: 100.0,
        ema_200: 110.0,
        current_price: 100.0,
    }
}

fn alert_at(symbol: &str, kind: AlertKind, timestamp: DateTime<Utc>) -> Alert {
    Alert {
        kind,
        symbol: symbol.to_string(),
        message: format!("{} test alert", symbol),
        trigger_value: 0.0,
        priority: Priority::Medium,
        timestamp,
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
}

#[test]
fn test_target_hit() {
    let alerts = check_price_alerts(&record("AAPL", 80.0, 100.0, 70.0, 105.0)).unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::TargetHit);
    assert_eq!(alerts[0].priority, Priority::High);
    assert_eq!(alerts[0].trigger_value, 100.0);
    assert!(alerts[0].message.contains("TARGET HIT"));
}

#[test]
fn test_stop_loss_hit() {
    let alerts = check_price_alerts(&record("AAPL", 80.0, 100.0, 70.0, 65.0)).unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::StopLoss);
    assert_eq!(alerts[0].priority, Priority::Critical);
    assert_eq!(alerts[0].trigger_value, 70.0);
}

#[test]
fn test_approaching_target_only() {
    // 96 is inside the 5% band below 100 but not a hit.
    let alerts = check_price_alerts(&record("AAPL", 80.0, 100.0, 70.0, 96.0)).unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].priority, Priority::Medium);
    assert!(alerts[0].message.contains("APPROACHING TARGET"));
}

#[test]
fn test_approaching_stop() {
    // 71 is inside the 5% band above the 70 stop.
    let alerts = check_price_alerts(&record("AAPL", 80.0, 100.0, 70.0, 71.0)).unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::StopLoss);
    assert_eq!(alerts[0].priority, Priority::Medium);
    assert!(alerts[0].message.contains("APPROACHING STOP LOSS"));
}

#[test]
fn test_incomplete_record_yields_nothing() {
    // Unset current price means the data is incomplete, not an error.
    let alerts = check_price_alerts(&record("AAPL", 80.0, 100.0, 70.0, 0.0)).unwrap();
    assert!(alerts.is_empty());
}

#[test]
fn test_non_finite_price_is_an_error() {
    let result = check_price_alerts(&record("AAPL", 80.0, 100.0, 70.0, f64::NAN));
    assert!(result.is_err());
}

#[test]
fn test_rsi_oversold_buy_signal() {
    let mut snapshot = neutral_snapshot();
    snapshot.rsi = 20.0;

    let alerts = check_technical_alerts("TCS", &snapshot).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::TechnicalBuy);
    assert_eq!(alerts[0].priority, Priority::High);
}

#[test]
fn test_neutral_rsi_no_alert() {
    let alerts = check_technical_alerts("TCS", &neutral_snapshot()).unwrap();
    assert!(alerts.is_empty());
}

#[test]
fn test_bollinger_lower_band_without_rsi_alert() {
    let mut snapshot = neutral_snapshot();
    snapshot.bollinger_position = 0.02;
    snapshot.rsi = 60.0;

    let alerts = check_technical_alerts("TCS", &snapshot).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::TechnicalBuy);
    assert!(alerts[0].message.contains("BOLLINGER"));
}

#[test]
fn test_macd_proximity_signal() {
    let mut snapshot = neutral_snapshot();
    snapshot.macd = 0.55;
    snapshot.macd_signal = 0.50;

    let alerts = check_technical_alerts("TCS", &snapshot).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::TechnicalBuy);
    assert_eq!(alerts[0].priority, Priority::Medium);
    assert!((alerts[0].trigger_value - 0.05).abs() < 1e-9);
}

#[test]
fn test_golden_cross_signal() {
    let mut snapshot = neutral_snapshot();
    snapshot.ema_50 = 101.0;
    snapshot.ema_200 = 100.0;

    let alerts = check_technical_alerts("TCS", &snapshot).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::TechnicalBuy);
    assert_eq!(alerts[0].priority, Priority::High);
    assert!(alerts[0].message.contains("GOLDEN CROSS"));
}

#[test]
fn test_multiple_technical_signals_fire_together() {
    let mut snapshot = neutral_snapshot();
    snapshot.rsi = 20.0;
    snapshot.bollinger_position = 0.02;

    let alerts = check_technical_alerts("TCS", &snapshot).unwrap();
    assert_eq!(alerts.len(), 2);
}

#[test]
fn test_portfolio_loss_beats_low_winrate() {
    let records = vec![
        record("A", 100.0, 150.0, 80.0, 80.0),
        record("B", 100.0, 150.0, 80.0, 82.0),
    ];

    let alerts = check_portfolio_alerts(&records).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::PortfolioLoss);
    assert_eq!(alerts[0].priority, Priority::High);
    // avg of -20% and -18%
    assert!((alerts[0].trigger_value - (-19.0)).abs() < 1e-9);
}

#[test]
fn test_low_winrate_alert() {
    let records = vec![
        record("A", 100.0, 150.0, 80.0, 99.0),
        record("B", 100.0, 150.0, 80.0, 99.0),
        record("C", 100.0, 150.0, 80.0, 99.0),
    ];

    let alerts = check_portfolio_alerts(&records).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::LowWinrate);
    assert_eq!(alerts[0].priority, Priority::Medium);
}

#[test]
fn test_winrate_denominator_counts_unpriced_records() {
    // One winner plus three records without prices: the win rate is
    // 1/4 = 25% even though only one record was evaluated.
    let records = vec![
        record("A", 100.0, 150.0, 80.0, 120.0),
        record("B", 0.0, 0.0, 0.0, 0.0),
        record("C", 0.0, 0.0, 0.0, 0.0),
        record("D", 0.0, 0.0, 0.0, 0.0),
    ];

    let alerts = check_portfolio_alerts(&records).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::LowWinrate);
}

#[test]
fn test_empty_portfolio_no_alert() {
    assert!(check_portfolio_alerts(&[]).unwrap().is_empty());
}

#[test]
fn test_dedup_suppresses_within_cooldown() {
    let mut history = AlertHistory::default();
    let start = t0();

    let first = history.admit_at(start, vec![alert_at("AAPL", AlertKind::TargetHit, start)]);
    assert_eq!(first.len(), 1);

    let again = start + Duration::minutes(10);
    let second = history.admit_at(again, vec![alert_at("AAPL", AlertKind::TargetHit, again)]);
    assert!(second.is_empty());

    // Past the cooldown the same (symbol, kind) fires again.
    let later = start + Duration::minutes(61);
    let third = history.admit_at(later, vec![alert_at("AAPL", AlertKind::TargetHit, later)]);
    assert_eq!(third.len(), 1);
}

#[test]
fn test_dedup_distinguishes_kind_and_symbol() {
    let mut history = AlertHistory::default();
    let start = t0();

    let admitted = history.admit_at(
        start,
        vec![
            alert_at("AAPL", AlertKind::TargetHit, start),
            alert_at("AAPL", AlertKind::StopLoss, start),
            alert_at("TSLA", AlertKind::TargetHit, start),
        ],
    );
    assert_eq!(admitted.len(), 3);
}

#[test]
fn test_dedup_within_single_batch() {
    let mut history = AlertHistory::default();
    let start = t0();

    let admitted = history.admit_at(
        start,
        vec![
            alert_at("AAPL", AlertKind::TargetHit, start),
            alert_at("AAPL", AlertKind::TargetHit, start),
        ],
    );
    assert_eq!(admitted.len(), 1);
}

#[test]
fn test_dedup_preserves_input_order() {
    let mut history = AlertHistory::default();
    let start = t0();

    let admitted = history.admit_at(
        start,
        vec![
            alert_at("AAPL", AlertKind::TargetHit, start),
            alert_at("TSLA", AlertKind::StopLoss, start),
            alert_at("INFY", AlertKind::TechnicalBuy, start),
        ],
    );
    let symbols: Vec<&str> = admitted.iter().map(|a| a.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "TSLA", "INFY"]);
}

#[test]
fn test_history_bounded_fifo() {
    let mut history = AlertHistory::default();
    let start = t0();

    let batch: Vec<Alert> = (0..150)
        .map(|i| alert_at(&format!("S{}", i), AlertKind::TargetHit, start))
        .collect();
    let admitted = history.admit_at(start, batch);

    assert_eq!(admitted.len(), 150);
    assert_eq!(history.len(), 100);
    // Oldest 50 were evicted first.
    let oldest = history.iter().next().map(|a| a.symbol.clone());
    assert_eq!(oldest.as_deref(), Some("S50"));

    // An evicted entry re-fires even inside its cooldown.
    let soon = start + Duration::minutes(1);
    let refired = history.admit_at(soon, vec![alert_at("S0", AlertKind::TargetHit, soon)]);
    assert_eq!(refired.len(), 1);
}

#[test]
fn test_recent_is_newest_first() {
    let mut history = AlertHistory::default();
    let start = t0();

    history.admit_at(
        start,
        vec![
            alert_at("AAPL", AlertKind::TargetHit, start),
            alert_at("TSLA", AlertKind::StopLoss, start),
        ],
    );

    let recent = history.recent(10);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].symbol, "TSLA");
    assert_eq!(recent[1].symbol, "AAPL");
}

#[test]
fn test_format_alert_marks_priority() {
    let mut alert = alert_at("AAPL", AlertKind::StopLoss, t0());
    alert.priority = Priority::Critical;
    alert.message = "stop hit".to_string();

    let rendered = format_alert(&alert);
    assert!(rendered.starts_with("🚨"));
    assert!(rendered.contains("12:00:00"));
    assert!(rendered.contains("stop hit"));
}

#[test]
fn test_format_summary_groups_by_priority() {
    let start = t0();
    let mut critical = alert_at("AAPL", AlertKind::StopLoss, start);
    critical.priority = Priority::Critical;
    let mut high = alert_at("TSLA", AlertKind::TargetHit, start);
    high.priority = Priority::High;
    let medium = alert_at("INFY", AlertKind::TechnicalBuy, start);

    let summary = format_summary(&[critical, high, medium]);
    assert!(summary.contains("3 alerts"));
    assert!(summary.contains("CRITICAL (1)"));
    assert!(summary.contains("HIGH (1)"));
    assert!(summary.contains("MEDIUM (1)"));
    assert!(summary.contains("• AAPL: Stop Loss"));
    assert!(summary.contains("• INFY: Technical Buy"));
}

#[test]
fn test_format_summary_empty() {
    assert_eq!(format_summary(&[]), "No alerts at this time.");
}

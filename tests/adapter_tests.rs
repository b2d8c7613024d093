use std::collections::HashMap;

use stockwatch_agent::bot::{Command, CommandError};
use stockwatch_agent::config::MarketDataConfig;
use stockwatch_agent::market::{compute_snapshot, technical_report, HistoryClient, IndicatorSnapshot, QuoteClient};
use stockwatch_agent::watchlist::{JsonWatchlistStore, PositionRecord, WatchlistStore};

fn market_config(server_url: &str) -> MarketDataConfig {
    MarketDataConfig {
        nse_quote_url: format!("{}/nse-quote", server_url),
        yahoo_chart_url: format!("{}/chart", server_url),
        quote_cache_secs: 300,
        history_range: "3mo".to_string(),
        request_timeout_secs: 5,
    }
}

#[test]
fn test_parse_add_stock() {
    let parsed = Command::parse("/add_stock aapl buy=150 target=180 stop=140 notes=Tech giant")
        .expect("is a command")
        .expect("parses");

    assert_eq!(
        parsed,
        Command::AddStock {
            symbol: "AAPL".to_string(),
            buy: 150.0,
            target: 180.0,
            stop: 140.0,
            notes: "Tech giant".to_string(),
        }
    );
}

#[test]
fn test_parse_add_stock_notes_before_prices() {
    let parsed = Command::parse("/add_stock TSLA notes=EV leader buy=200 target=250 stop=180")
        .expect("is a command")
        .expect("parses");

    match parsed {
        Command::AddStock { notes, buy, .. } => {
            assert_eq!(notes, "EV leader");
            assert_eq!(buy, 200.0);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_parse_add_stock_missing_params() {
    let parsed = Command::parse("/add_stock AAPL buy=150").expect("is a command");
    assert_eq!(parsed, Err(CommandError::MissingParams));
}

#[test]
fn test_parse_add_stock_bad_number() {
    let parsed = Command::parse("/add_stock AAPL buy=abc target=180 stop=140").expect("is a command");
    assert_eq!(parsed, Err(CommandError::BadNumber));
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert!(Command::parse("hello there").is_none());
}

#[test]
fn test_unknown_command() {
    let parsed = Command::parse("/frobnicate").expect("is a command");
    assert_eq!(parsed, Err(CommandError::Unknown));
}

#[test]
fn test_parse_simple_commands() {
    assert_eq!(Command::parse("/list").unwrap().unwrap(), Command::List);
    assert_eq!(Command::parse("/alerts").unwrap().unwrap(), Command::Alerts);
    assert_eq!(
        Command::parse("/remove_stock infy").unwrap().unwrap(),
        Command::RemoveStock {
            symbol: "INFY".to_string()
        }
    );
    // Group chats append the bot name to the command.
    assert_eq!(
        Command::parse("/list@stockwatch_bot").unwrap().unwrap(),
        Command::List
    );
}

#[test]
fn test_snapshot_needs_enough_history() {
    let closes = vec![100.0; 10];
    assert!(compute_snapshot(&closes).unwrap().is_none());
}

#[test]
fn test_snapshot_from_trending_series() {
    let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
    let snapshot = compute_snapshot(&closes).unwrap().expect("enough history");

    assert_eq!(snapshot.current_price, 159.0);
    // A straight uptrend keeps RSI pinned high and MACD above its signal.
    assert!(snapshot.rsi > 70.0);
    assert!(snapshot.macd > snapshot.macd_signal);
    assert!(snapshot.ema_50 > 0.0);
    assert!(snapshot.ema_200 > 0.0);
    assert!(snapshot.bollinger_position.is_finite());
}

#[test]
fn test_technical_report_majority_vote() {
    let snapshot = IndicatorSnapshot {
        rsi: 20.0,
        macd: 1.0,
        macd_signal: 0.5,
        macd_histogram: 0.5,
        bollinger_position: 0.1,
        ema_50: 110.0,
        ema_200: 100.0,
        current_price: 105.0,
    };

    let report = technical_report("TCS", &snapshot);
    assert!(report.contains("TCS Analysis"));
    assert!(report.contains("RSI: OVERSOLD (Buy)"));
    assert!(report.contains("**BUY** (4 vs 0)"));
}

#[tokio::test]
async fn test_quote_falls_back_to_yahoo() {
    let mut server = mockito::Server::new_async().await;
    let yahoo_mock = server
        .mock("GET", "/chart/TCS.NS")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"chart":{"result":[{"meta":{"regularMarketPrice":3500.5}}]}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = QuoteClient::new(&market_config(&server.url()));

    let price = client.get_price("tcs").await.expect("price resolves");
    assert_eq!(price, 3500.5);

    // Second lookup inside the cache window must not hit the network.
    let cached = client.get_price("TCS").await.expect("cached price");
    assert_eq!(cached, 3500.5);
    yahoo_mock.assert_async().await;
}

#[tokio::test]
async fn test_quote_prefers_nse() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/nse-quote")
        .match_query(mockito::Matcher::UrlEncoded(
            "symbol".to_string(),
            "INFY".to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"priceInfo":{"lastPrice":1450.75}}"#)
        .create_async()
        .await;

    let client = QuoteClient::new(&market_config(&server.url()));
    let price = client.get_price("INFY").await.expect("price resolves");
    assert_eq!(price, 1450.75);
}

#[tokio::test]
async fn test_history_drops_missing_closes() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/chart/INFY.NS")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[100.0,null,101.5]}]}}]}}"#,
        )
        .create_async()
        .await;

    let client = HistoryClient::new(&market_config(&server.url()));
    let closes = client.get_daily_closes("INFY").await.expect("history resolves");
    assert_eq!(closes, vec![100.0, 101.5]);
}

#[tokio::test]
async fn test_json_store_lifecycle() {
    let path = std::env::temp_dir().join(format!("stockwatch-test-{}.json", std::process::id()));
    let _ = tokio::fs::remove_file(&path).await;

    {
        let store = JsonWatchlistStore::open(&path).await.expect("open");
        store
            .add(PositionRecord::new("tcs", 3000.0, 3600.0, 2700.0, "IT major"))
            .await
            .expect("add");

        // Duplicate symbols are rejected.
        assert!(store
            .add(PositionRecord::new("TCS", 1.0, 2.0, 0.5, ""))
            .await
            .is_err());

        let mut prices = HashMap::new();
        prices.insert("TCS".to_string(), 3100.0);
        assert_eq!(store.bulk_update_prices(&prices).await.expect("bulk"), 1);
    }

    // Reopen from disk: the record and the refreshed price survived.
    let store = JsonWatchlistStore::open(&path).await.expect("reopen");
    let record = store.get("tcs").await.expect("get").expect("present");
    assert_eq!(record.symbol, "TCS");
    assert_eq!(record.current_price, 3100.0);

    assert!(store.remove("TCS").await.expect("remove"));
    assert!(!store.remove("TCS").await.expect("second remove"));
    assert!(store.get_all().await.expect("get_all").is_empty());

    let _ = tokio::fs::remove_file(&path).await;
}

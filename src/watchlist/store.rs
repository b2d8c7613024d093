use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use super::types::PositionRecord;

/// Storage seam for the watchlist. The monitor and the bot only talk to
/// this trait; the backing store is swappable in tests.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<PositionRecord>>;

    async fn get(&self, symbol: &str) -> Result<Option<PositionRecord>>;

    async fn add(&self, record: PositionRecord) -> Result<()>;

    /// Returns false when the symbol was not present.
    async fn remove(&self, symbol: &str) -> Result<bool>;

    async fn update_price(&self, symbol: &str, price: f64) -> Result<bool>;

    /// Returns the number of records refreshed.
    async fn bulk_update_prices(&self, prices: &HashMap<String, f64>) -> Result<usize>;
}

/// File-backed store: the whole watchlist serialized as one JSON array,
/// rewritten after each mutation. Small personal watchlists only.
pub struct JsonWatchlistStore {
    path: PathBuf,
    records: RwLock<Vec<PositionRecord>>,
}

impl JsonWatchlistStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Vec<PositionRecord> = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!(
            "📋 Watchlist loaded: {} records from {}",
            records.len(),
            path.display()
        );
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    async fn persist(&self, records: &[PositionRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for JsonWatchlistStore {
    async fn get_all(&self) -> Result<Vec<PositionRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, symbol: &str) -> Result<Option<PositionRecord>> {
        let symbol = symbol.to_uppercase();
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.symbol == symbol)
            .cloned())
    }

    async fn add(&self, record: PositionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.symbol == record.symbol) {
            bail!("{} is already on the watchlist", record.symbol);
        }
        info!("📝 Watchlist add: {}", record.symbol);
        records.push(record);
        self.persist(&records).await
    }

    async fn remove(&self, symbol: &str) -> Result<bool> {
        let symbol = symbol.to_uppercase();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.symbol != symbol);
        if records.len() == before {
            return Ok(false);
        }
        info!("🗑️ Watchlist remove: {}", symbol);
        self.persist(&records).await?;
        Ok(true)
    }

    async fn update_price(&self, symbol: &str, price: f64) -> Result<bool> {
        let symbol = symbol.to_uppercase();
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| r.symbol == symbol) else {
            return Ok(false);
        };
        record.current_price = price;
        record.last_updated = Utc::now();
        self.persist(&records).await?;
        Ok(true)
    }

    async fn bulk_update_prices(&self, prices: &HashMap<String, f64>) -> Result<usize> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for record in records.iter_mut() {
            if let Some(&price) = prices.get(&record.symbol) {
                record.current_price = price;
                record.last_updated = now;
                updated += 1;
            }
        }
        if updated > 0 {
            self.persist(&records).await?;
        }
        Ok(updated)
    }
}

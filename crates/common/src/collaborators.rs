use async_trait::async_trait;

use crate::{Alert, Candle, MarketSummary, Result};

/// Source of candles and live prices for a symbol.
///
/// `BinanceMarketData` implements this against the public REST API.
/// Called once per symbol per cycle; retries are the implementor's concern.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Recent candles for `symbol`, oldest first.
    async fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>>;

    /// Last traded price for `symbol`.
    async fn fetch_live_price(&self, symbol: &str) -> Result<f64>;
}

/// Free-text trade commentary from a structured market summary (an LLM in practice).
///
/// Only consulted in narrative mode. A failed call must be returned as `Err`,
/// never as text, so it cannot be mistaken for analysis.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, summary: &MarketSummary) -> Result<String>;
}

/// Delivery channel for formatted alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<()>;
}

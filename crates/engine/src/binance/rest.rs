use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use common::{Candle, Error, MarketDataSource, Result};

const BASE_URL: &str = "https://api.binance.com";

/// Public (unsigned) Binance REST endpoints for klines and ticker prices.
pub struct BinanceMarketData {
    http: Client,
    base_url: String,
    interval: String,
    limit: usize,
}

impl BinanceMarketData {
    pub fn new(interval: impl Into<String>, limit: usize) -> Result<Self> {
        Self::with_base_url(BASE_URL, interval, limit)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        interval: impl Into<String>,
        limit: usize,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            interval: interval.into(),
            limit,
        })
    }

    async fn get(&self, path: &str, query: &str) -> Result<String> {
        let url = format!("{}{path}?{query}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for BinanceMarketData {
    async fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>> {
        debug!(symbol, interval = %self.interval, limit = self.limit, "Fetching klines");
        let query = format!(
            "symbol={symbol}&interval={}&limit={}",
            self.interval, self.limit
        );
        let body = self.get("/api/v3/klines", &query).await?;
        parse_klines(&body)
    }

    async fn fetch_live_price(&self, symbol: &str) -> Result<f64> {
        let body = self
            .get("/api/v3/ticker/price", &format!("symbol={symbol}"))
            .await?;
        let ticker: PriceTicker = serde_json::from_str(&body)?;
        ticker
            .price
            .parse::<f64>()
            .map_err(|e| Error::Exchange(format!("bad ticker price '{}': {e}", ticker.price)))
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PriceTicker {
    price: String,
}

/// Kline rows are positional arrays:
/// `[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]`.
fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    rows.iter().map(|row| parse_kline_row(row)).collect()
}

fn parse_kline_row(row: &[Value]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(Error::Exchange(format!("kline row has {} fields", row.len())));
    }
    let open_time_ms = row[0]
        .as_i64()
        .ok_or_else(|| Error::Exchange("kline open time is not an integer".into()))?;
    let timestamp: DateTime<Utc> = DateTime::from_timestamp_millis(open_time_ms)
        .ok_or_else(|| Error::Exchange(format!("kline open time out of range: {open_time_ms}")))?;

    Ok(Candle {
        open: decimal_field(&row[1], "open")?,
        high: decimal_field(&row[2], "high")?,
        low: decimal_field(&row[3], "low")?,
        close: decimal_field(&row[4], "close")?,
        volume: decimal_field(&row[5], "volume")?,
        timestamp,
    })
}

fn decimal_field(value: &Value, name: &str) -> Result<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Error::Exchange(format!("kline {name} is not a decimal string: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KLINES: &str = r#"[
        [1700000000000, "100.5", "101.0", "99.8", "100.9", "1234.5", 1700001799999, "0", 10, "0", "0", "0"],
        [1700001800000, "100.9", "102.2", "100.1", "101.7", "987.0", 1700003599999, "0", 12, "0", "0", "0"]
    ]"#;

    #[test]
    fn parses_kline_rows_oldest_first() {
        let candles = parse_klines(KLINES).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 100.5);
        assert_eq!(candles[0].volume, 1234.5);
        assert_eq!(candles[1].close, 101.7);
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert!(candles.iter().all(Candle::is_well_formed));
    }

    #[test]
    fn rejects_short_or_non_decimal_rows() {
        assert!(parse_klines(r#"[[1700000000000, "1", "2"]]"#).is_err());
        assert!(parse_klines(r#"[[1700000000000, 1, 2, 0.5, 1.5, 10]]"#).is_err());
        assert!(parse_klines(r#"{"code": -1121, "msg": "Invalid symbol."}"#).is_err());
    }
}

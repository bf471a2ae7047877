//! In-test collaborators for the evaluator and engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use chrono::DateTime;
use tokio::sync::RwLock;

use common::{
    Alert, AlertSink, Candle, Error, MarketDataSource, MarketSummary, NarrativeGenerator, Result,
};
use tracker::TradeTracker;

fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle {
        open,
        high,
        low,
        close,
        volume,
        timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    }
}

/// Twenty-candle downtrend with an order block and a closing volume spike.
/// Scores 3 (RSI oversold, volume, order block) → Long.
/// Last close 180.0, last low 179.7, so the stop sits at 179.7 × 0.997.
pub fn long_setup() -> Vec<Candle> {
    (0..20)
        .map(|i| {
            let open = 200.0 - i as f64;
            let close = open - 1.0;
            let (wick_up, wick_down) = if i == 8 { (0.05, 0.05) } else { (0.3, 0.3) };
            let volume = if i == 19 { 1000.0 } else { 100.0 };
            candle(open, open + wick_up, close - wick_down, close, volume)
        })
        .collect()
}

pub const LONG_SETUP_PRICE: f64 = 180.0;
pub const LONG_SETUP_STOP: f64 = 179.7 * 0.997;

/// Market data keyed by symbol. Symbols without an entry fail to fetch.
#[derive(Default)]
pub struct MockMarket {
    candles: Mutex<HashMap<String, Vec<Candle>>>,
    prices: Mutex<HashMap<String, f64>>,
}

impl MockMarket {
    pub fn with(symbols: &[&str], candles: Vec<Candle>, price: f64) -> Self {
        let market = Self::default();
        for s in symbols {
            market.set(s, candles.clone(), price);
        }
        market
    }

    pub fn set(&self, symbol: &str, candles: Vec<Candle>, price: f64) {
        self.candles.lock().unwrap().insert(symbol.to_string(), candles);
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }
}

#[async_trait]
impl MarketDataSource for MockMarket {
    async fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>> {
        self.candles
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| Error::Exchange(format!("no data for {symbol}")))
    }

    async fn fetch_live_price(&self, symbol: &str) -> Result<f64> {
        self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::Exchange(format!("no price for {symbol}")))
    }
}

/// Returns a fixed reply, or fails when constructed with `None`.
///
/// When watching a tracker, records on every call whether it could be read.
pub struct StaticNarrator {
    pub reply: Option<String>,
    pub calls: Mutex<Vec<MarketSummary>>,
    pub tracker_readable: Mutex<Vec<bool>>,
    tracker: OnceLock<Arc<RwLock<TradeTracker>>>,
}

impl StaticNarrator {
    pub fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(String::from),
            calls: Mutex::new(Vec::new()),
            tracker_readable: Mutex::new(Vec::new()),
            tracker: OnceLock::new(),
        }
    }

    pub fn watch_tracker(&self, tracker: Arc<RwLock<TradeTracker>>) {
        let _ = self.tracker.set(tracker);
    }
}

#[async_trait]
impl NarrativeGenerator for StaticNarrator {
    async fn generate(&self, summary: &MarketSummary) -> Result<String> {
        self.calls.lock().unwrap().push(summary.clone());
        if let Some(tracker) = self.tracker.get() {
            let readable = tracker.try_read().is_ok();
            self.tracker_readable.lock().unwrap().push(readable);
        }
        self.reply
            .clone()
            .ok_or_else(|| Error::Narrative("upstream timeout".into()))
    }
}

/// Records every delivered alert; optionally fails every delivery.
#[derive(Default)]
pub struct RecordingSink {
    pub fail: bool,
    pub sent: Mutex<Vec<Alert>>,
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, alert: &Alert) -> Result<()> {
        if self.fail {
            return Err(Error::Alert("chat unreachable".into()));
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

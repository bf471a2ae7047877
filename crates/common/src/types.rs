use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV sample for a fixed interval. Series are ordered oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    /// `high >= max(open, close)` and `low <= min(open, close)`.
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }

    /// Absolute body size, `|close - open|`.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full range, `high - low`.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// `price` is at or beyond `stop_loss` on the losing side of this direction.
    pub fn stop_breached(self, price: f64, stop_loss: f64) -> bool {
        match self {
            Direction::Long => price <= stop_loss,
            Direction::Short => price >= stop_loss,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A synthesized trade recommendation.
///
/// Either every field is populated from the same evaluation or no `Signal`
/// exists at all; there is no partially-filled state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub score: u32,
    /// Human-readable contributing factors, in the order they were found.
    pub reasons: Vec<String>,
}

impl Signal {
    /// Prices are finite, positive and on the right side of the entry:
    /// Long needs `stop < entry < target`, Short needs `target < entry < stop`.
    pub fn is_coherent(&self) -> bool {
        let prices = [self.entry_price, self.stop_loss, self.take_profit];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        match self.direction {
            Direction::Long => {
                self.stop_loss < self.entry_price && self.entry_price < self.take_profit
            }
            Direction::Short => {
                self.take_profit < self.entry_price && self.entry_price < self.stop_loss
            }
        }
    }
}

/// The tracker's record of a live signal awaiting invalidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub opened_at: DateTime<Utc>,
}

impl From<&Signal> for OpenPosition {
    fn from(signal: &Signal) -> Self {
        Self {
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            entry_price: signal.entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            opened_at: Utc::now(),
        }
    }
}

/// What the last emitted alert for a symbol looked like. Used only to gate re-alerts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertMemory {
    pub direction: Direction,
    pub entry_price: f64,
    /// Live price at the time the alert went out.
    pub alerted_price: f64,
}

/// Structured market summary handed to a `NarrativeGenerator`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub symbol: String,
    pub live_price: f64,
    pub rsi_period: usize,
    pub rsi: f64,
    pub last_volume: f64,
    pub avg_volume: f64,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    NewSignal,
    StopLoss,
    TakeProfit,
}

/// A formatted message ready for the alert sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn new_signal(signal: &Signal) -> Self {
        let mut message = format!(
            "📢 {} {} signal (score {})\n\
             Entry: {:.4}\n\
             SL: {:.4}\n\
             TP: {:.4}",
            signal.symbol,
            signal.direction,
            signal.score,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
        );
        for reason in &signal.reasons {
            message.push_str("\n• ");
            message.push_str(reason);
        }
        Self {
            symbol: signal.symbol.clone(),
            kind: AlertKind::NewSignal,
            message,
        }
    }

    pub fn stop_loss(position: &OpenPosition, price: f64) -> Self {
        Self {
            symbol: position.symbol.clone(),
            kind: AlertKind::StopLoss,
            message: format!(
                "⚠️ {} {} invalidated: price {price:.4} breached stop-loss {:.4} (entry {:.4}).",
                position.symbol, position.direction, position.stop_loss, position.entry_price,
            ),
        }
    }

    pub fn take_profit(position: &OpenPosition, price: f64) -> Self {
        Self {
            symbol: position.symbol.clone(),
            kind: AlertKind::TakeProfit,
            message: format!(
                "✅ {} {} target reached: price {price:.4} hit take-profit {:.4} (entry {:.4}).",
                position.symbol, position.direction, position.take_profit, position.entry_price,
            ),
        }
    }
}

/// Whether scheduled cycles are currently allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Running,
    Paused,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Running => write!(f, "running"),
            EngineState::Paused => write!(f, "paused"),
        }
    }
}

/// Commands sent to the engine via the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Pause,
    Resume,
    /// Run one cycle immediately, ignoring the schedule window.
    EvaluateNow,
}

//! Pure indicator functions over a candle window. No state, no I/O.

pub mod patterns;
pub mod rsi;
pub mod volume;

pub use patterns::{
    detect_all, detect_break_of_structure, detect_fair_value_gap, detect_order_block,
    detect_spring, PatternMatch, PatternTag,
};
pub use rsi::{compute_rsi, RsiIndicator};
pub use volume::{average_volume, is_volume_spike};

use common::{Candle, MarketSummary};

use crate::config::SynthesizerConfig;

/// Everything derived from one candle window. Recomputed every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub last_volume: f64,
    pub avg_volume: f64,
    pub patterns: Vec<PatternMatch>,
}

impl IndicatorSnapshot {
    pub fn compute(candles: &[Candle], cfg: &SynthesizerConfig) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        Self {
            rsi: compute_rsi(&closes, cfg.rsi_period),
            last_volume: volumes.last().copied().unwrap_or(0.0),
            avg_volume: average_volume(&volumes, cfg.volume_period),
            patterns: detect_all(candles),
        }
    }

    pub fn has(&self, tag: PatternTag) -> bool {
        self.patterns.iter().any(|p| p.tag == tag)
    }

    pub fn summary(&self, symbol: &str, live_price: f64, rsi_period: usize) -> MarketSummary {
        MarketSummary {
            symbol: symbol.to_string(),
            live_price,
            rsi_period,
            rsi: self.rsi,
            last_volume: self.last_volume,
            avg_volume: self.avg_volume,
            patterns: self.patterns.iter().map(|p| p.description.clone()).collect(),
        }
    }
}

#[cfg(test)]
pub(crate) fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        open,
        high,
        low,
        close,
        volume: 100.0,
        timestamp: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    }
}

/// Staircase down: each candle opens at the prior close, one point lower,
/// with 0.3 wicks. Triggers no pattern detector.
#[cfg(test)]
pub(crate) fn descending(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let open = 200.0 - i as f64;
            let close = open - 1.0;
            candle(open, open + 0.3, close - 0.3, close)
        })
        .collect()
}

/// Staircase up, mirror of [`descending`]. Triggers no pattern detector.
#[cfg(test)]
pub(crate) fn ascending(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let open = 100.0 + i as f64;
            let close = open + 1.0;
            candle(open, close + 0.3, open - 0.3, close)
        })
        .collect()
}

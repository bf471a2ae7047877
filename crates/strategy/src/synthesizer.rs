use common::{Candle, Direction, MarketSummary, Signal};
use tracing::debug;

use crate::config::SynthesizerConfig;
use crate::indicators::{is_volume_spike, IndicatorSnapshot, PatternTag, RsiIndicator};

/// Score one symbol's candle window at `live_price`.
///
/// Every contributing factor is binary: an RSI extreme, a volume spike, and
/// each detected pattern add one point. A detected spring forces Long over any
/// RSI bias. A signal needs a direction and `score >= score_threshold`.
/// Returns `None` on insufficient data or when the resulting levels are
/// incoherent (live price already beyond the structural stop).
pub fn synthesize(
    symbol: &str,
    candles: &[Candle],
    live_price: f64,
    cfg: &SynthesizerConfig,
) -> Option<Signal> {
    if candles.len() < cfg.min_candles() {
        debug!(symbol, candles = candles.len(), needed = cfg.min_candles(), "Insufficient data");
        return None;
    }

    let snapshot = IndicatorSnapshot::compute(candles, cfg);
    let rsi = RsiIndicator::new(cfg.rsi_period, cfg.rsi_overbought, cfg.rsi_oversold);

    let mut score = 0u32;
    let mut reasons = Vec::new();
    let mut direction = rsi.bias(snapshot.rsi);

    match direction {
        Some(Direction::Long) => {
            score += 1;
            reasons.push(format!("RSI({}) {:.2} oversold", cfg.rsi_period, snapshot.rsi));
        }
        Some(Direction::Short) => {
            score += 1;
            reasons.push(format!("RSI({}) {:.2} overbought", cfg.rsi_period, snapshot.rsi));
        }
        None => {}
    }

    if is_volume_spike(snapshot.last_volume, snapshot.avg_volume, cfg.volume_spike_multiplier) {
        score += 1;
        reasons.push(format!(
            "Volume spike {:.2} vs avg {:.2} ({:.1}x)",
            snapshot.last_volume,
            snapshot.avg_volume,
            snapshot.last_volume / snapshot.avg_volume
        ));
    }

    for pattern in &snapshot.patterns {
        score += 1;
        reasons.push(pattern.description.clone());
    }

    // Spring overrides whatever bias RSI produced.
    if snapshot.has(PatternTag::Spring) {
        direction = Some(Direction::Long);
    }

    let Some(direction) = direction else {
        debug!(symbol, score, "No directional bias");
        return None;
    };
    if score < cfg.score_threshold {
        debug!(symbol, score, threshold = cfg.score_threshold, "Score below threshold");
        return None;
    }

    let stop_loss = stop_loss(candles, direction, cfg);
    let take_profit = take_profit(live_price, stop_loss, direction, cfg.risk_reward);

    let signal = Signal {
        symbol: symbol.to_string(),
        direction,
        entry_price: live_price,
        stop_loss,
        take_profit,
        score,
        reasons,
    };

    if !signal.is_coherent() {
        debug!(
            symbol,
            %direction,
            entry = live_price,
            stop_loss,
            "Live price already beyond structural stop"
        );
        return None;
    }
    Some(signal)
}

/// Structured summary for the narrative generator, or `None` on insufficient data.
pub fn market_summary(
    symbol: &str,
    candles: &[Candle],
    live_price: f64,
    cfg: &SynthesizerConfig,
) -> Option<MarketSummary> {
    if candles.len() < cfg.min_candles() {
        return None;
    }
    Some(IndicatorSnapshot::compute(candles, cfg).summary(symbol, live_price, cfg.rsi_period))
}

/// Just beyond the trailing `stop_lookback` candles' extreme:
/// below the lowest low for Long, above the highest high for Short.
pub fn stop_loss(candles: &[Candle], direction: Direction, cfg: &SynthesizerConfig) -> f64 {
    let recent = &candles[candles.len().saturating_sub(cfg.stop_lookback)..];
    match direction {
        Direction::Long => {
            let lowest = recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            lowest * (1.0 - cfg.stop_buffer_pct)
        }
        Direction::Short => {
            let highest = recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            highest * (1.0 + cfg.stop_buffer_pct)
        }
    }
}

/// Fixed risk/reward target: `entry ± risk_reward * |entry - stop|`.
pub fn take_profit(entry: f64, stop_loss: f64, direction: Direction, risk_reward: f64) -> f64 {
    let reward = (entry - stop_loss).abs() * risk_reward;
    match direction {
        Direction::Long => entry + reward,
        Direction::Short => entry - reward,
    }
}

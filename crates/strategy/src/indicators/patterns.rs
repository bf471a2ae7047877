//! Structural pattern detectors.
//!
//! Each detector answers "did this pattern occur somewhere in the window" and
//! returns at most one match, so callers can only weight by presence.

use common::Candle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternTag {
    FairValueGapBullish,
    FairValueGapBearish,
    OrderBlock,
    BreakOfStructure,
    Spring,
}

/// A detected pattern and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub tag: PatternTag,
    /// Index of the candle the pattern is anchored on.
    pub index: usize,
    pub description: String,
}

/// Minimum body/range ratio for an order-block candle.
pub const ORDER_BLOCK_BODY_RATIO: f64 = 0.7;

/// First fair value gap, scanning oldest to newest.
///
/// For each triplet ending at `i`: bullish when candle `i-1` trades entirely
/// above candle `i-2`'s high, bearish when candle `i-1`'s high sits below
/// candle `i`'s low. The earliest triplet wins.
pub fn detect_fair_value_gap(candles: &[Candle]) -> Option<PatternMatch> {
    for i in 2..candles.len() {
        let (first, middle, last) = (&candles[i - 2], &candles[i - 1], &candles[i]);
        if middle.low > first.high {
            return Some(PatternMatch {
                tag: PatternTag::FairValueGapBullish,
                index: i - 1,
                description: format!(
                    "Bullish FVG {:.4}–{:.4}",
                    first.high, middle.low
                ),
            });
        }
        if middle.high < last.low {
            return Some(PatternMatch {
                tag: PatternTag::FairValueGapBearish,
                index: i - 1,
                description: format!(
                    "Bearish FVG {:.4}–{:.4}",
                    middle.high, last.low
                ),
            });
        }
    }
    None
}

/// Most recent large-bodied candle, scanning from the second-to-last backward.
///
/// The newest candle is skipped since it may still be forming.
pub fn detect_order_block(candles: &[Candle]) -> Option<PatternMatch> {
    if candles.len() < 2 {
        return None;
    }
    (0..candles.len() - 1).rev().find_map(|i| {
        let c = &candles[i];
        let range = c.range();
        if range > 0.0 && c.body() > ORDER_BLOCK_BODY_RATIO * range {
            Some(PatternMatch {
                tag: PatternTag::OrderBlock,
                index: i,
                description: format!(
                    "Order block {:.4}–{:.4} (body {:.0}% of range)",
                    c.low,
                    c.high,
                    c.body() / range * 100.0
                ),
            })
        } else {
            None
        }
    })
}

/// First single-bar peak: a high above both neighbouring highs.
pub fn detect_break_of_structure(candles: &[Candle]) -> Option<PatternMatch> {
    (1..candles.len().saturating_sub(1)).find_map(|i| {
        let high = candles[i].high;
        if high > candles[i - 1].high && high > candles[i + 1].high {
            Some(PatternMatch {
                tag: PatternTag::BreakOfStructure,
                index: i,
                description: format!("BOS swing high at {high:.4}"),
            })
        } else {
            None
        }
    })
}

/// First undercut-and-reclaim: low below the prior low, close back above it.
pub fn detect_spring(candles: &[Candle]) -> Option<PatternMatch> {
    (1..candles.len()).find_map(|i| {
        let prior_low = candles[i - 1].low;
        let c = &candles[i];
        if c.low < prior_low && c.close > prior_low {
            Some(PatternMatch {
                tag: PatternTag::Spring,
                index: i,
                description: format!(
                    "Spring: swept {prior_low:.4} to {:.4}, closed {:.4}",
                    c.low, c.close
                ),
            })
        } else {
            None
        }
    })
}

/// All four detectors in their fixed order: FVG, order block, BOS, spring.
pub fn detect_all(candles: &[Candle]) -> Vec<PatternMatch> {
    [
        detect_fair_value_gap(candles),
        detect_order_block(candles),
        detect_break_of_structure(candles),
        detect_spring(candles),
    ]
    .into_iter()
    .flatten()
    .collect()
}

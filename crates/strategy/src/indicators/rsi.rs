use common::Direction;

/// RSI (Relative Strength Index) indicator.
///
/// Simple (non-smoothed) form: mean gain over mean loss across the trailing
/// `period` close-to-close changes, mapped onto 0–100.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl RsiIndicator {
    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self { period, overbought, oversold }
    }

    pub fn compute(&self, closes: &[f64]) -> f64 {
        compute_rsi(closes, self.period)
    }

    /// Oversold biases Long, overbought biases Short, anything between is neutral.
    pub fn bias(&self, rsi: f64) -> Option<Direction> {
        if rsi < self.oversold {
            Some(Direction::Long)
        } else if rsi > self.overbought {
            Some(Direction::Short)
        } else {
            None
        }
    }
}

/// RSI over the trailing `period` changes of `closes` (oldest first).
///
/// Returns `0.0` when fewer than `period` changes exist; callers must treat that
/// as "not enough data", not as an oversold reading. Returns `100.0` when there
/// was no loss in the window, including a flat series.
pub fn compute_rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 0.0;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), change| {
            if change > 0.0 {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_returns_sentinel_when_insufficient_data() {
        // Need at least period+1 = 15 values
        let prices = vec![100.0; 14];
        assert_eq!(compute_rsi(&prices, 14), 0.0);
        assert_eq!(compute_rsi(&[], 14), 0.0);
    }

    #[test]
    fn rsi_flat_series_returns_100() {
        let prices = vec![100.0; 15];
        assert_eq!(compute_rsi(&prices, 14), 100.0);
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        assert_eq!(compute_rsi(&prices, 3), 100.0);
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let prices = vec![14.0, 13.0, 12.0, 11.0, 10.0];
        let value = compute_rsi(&prices, 3);
        assert!(value.abs() < 1e-9, "Expected ~0, got {value}");
    }

    #[test]
    fn rsi_known_value() {
        // changes +1, -1, +2, -1 → avg gain 0.75, avg loss 0.5, RS 1.5
        let prices = vec![10.0, 11.0, 10.0, 12.0, 11.0];
        let value = compute_rsi(&prices, 4);
        assert!((value - 60.0).abs() < 1e-9, "Expected 60, got {value}");
    }

    #[test]
    fn rsi_only_uses_trailing_window() {
        // The early crash is outside the 3-change window
        let prices = vec![100.0, 50.0, 51.0, 52.0, 53.0];
        assert_eq!(compute_rsi(&prices, 3), 100.0);
    }

    #[test]
    fn bias_follows_thresholds() {
        let rsi = RsiIndicator::new(14, 70.0, 30.0);
        assert_eq!(rsi.bias(25.0), Some(Direction::Long));
        assert_eq!(rsi.bias(75.0), Some(Direction::Short));
        assert_eq!(rsi.bias(30.0), None);
        assert_eq!(rsi.bias(70.0), None);
    }
}

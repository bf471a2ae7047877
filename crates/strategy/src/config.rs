use serde::{Deserialize, Serialize};

/// Tunables for numeric signal synthesis. Loaded from the `[synthesizer]`
/// table of the signal config file; every field has a default.
///
/// ```toml
/// [synthesizer]
/// rsi_period = 14
/// volume_spike_multiplier = 1.5
/// score_threshold = 3
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthesizerConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Trailing window for the volume average.
    pub volume_period: usize,
    /// Latest volume must exceed this multiple of the average to count as a spike.
    pub volume_spike_multiplier: f64,
    /// Minimum score for a signal to be emitted.
    pub score_threshold: u32,
    /// Number of trailing candles the stop-loss is placed beyond.
    pub stop_lookback: usize,
    /// Buffer beyond recent structure, e.g. 0.003 = 0.3%.
    pub stop_buffer_pct: f64,
    /// Reward as a multiple of risk.
    pub risk_reward: f64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            volume_period: 14,
            volume_spike_multiplier: 1.5,
            score_threshold: 3,
            stop_lookback: 5,
            stop_buffer_pct: 0.003,
            risk_reward: 1.5,
        }
    }
}

impl SynthesizerConfig {
    /// Minimum number of candles needed before any signal can be produced.
    pub fn min_candles(&self) -> usize {
        self.rsi_period + 2
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.rsi_period < 2 {
            return Err(format!("rsi_period must be >= 2, got {}", self.rsi_period));
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(format!(
                "RSI thresholds must satisfy 0 <= oversold < overbought <= 100, got {} / {}",
                self.rsi_oversold, self.rsi_overbought
            ));
        }
        if self.volume_period == 0 || self.stop_lookback == 0 {
            return Err("volume_period and stop_lookback must be positive".into());
        }
        if self.volume_spike_multiplier <= 0.0 || self.risk_reward <= 0.0 {
            return Err("volume_spike_multiplier and risk_reward must be positive".into());
        }
        if !(0.0..1.0).contains(&self.stop_buffer_pct) {
            return Err(format!(
                "stop_buffer_pct must be in [0, 1), got {}",
                self.stop_buffer_pct
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_falls_back_to_defaults() {
        let cfg: SynthesizerConfig = toml::from_str("score_threshold = 4").unwrap();
        assert_eq!(cfg.score_threshold, 4);
        assert_eq!(cfg.rsi_period, 14);
        assert!((cfg.risk_reward - 1.5).abs() < 1e-12);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<SynthesizerConfig>("rsi_periods = 14").is_err());
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let cfg = SynthesizerConfig {
            rsi_oversold: 80.0,
            ..SynthesizerConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(SynthesizerConfig::default().validate().is_ok());
    }
}

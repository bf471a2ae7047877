use serde::{Deserialize, Serialize};

use common::{Error, Result};
use strategy::SynthesizerConfig;
use tracker::TrackerConfig;

use crate::schedule::ScheduleConfig;

/// How a symbol's candles are turned into a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Score indicators and patterns directly.
    #[default]
    Numeric,
    /// Ask the narrative generator and parse its labelled fields.
    Narrative,
}

/// Top-level signal config file (TOML).
///
/// Example `config/signals.toml`:
/// ```toml
/// symbols = ["BTCUSDT", "ETHUSDT"]
/// interval = "30m"
/// candle_limit = 100
/// mode = "numeric"
///
/// [synthesizer]
/// score_threshold = 3
///
/// [tracker]
/// dedup = "material_change"
///
/// [schedule]
/// poll_interval_secs = 1800
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalFileConfig {
    /// Evaluated in this order every cycle.
    pub symbols: Vec<String>,
    /// Binance kline interval, e.g. "30m".
    pub interval: String,
    /// Candles fetched per symbol.
    pub candle_limit: usize,
    pub mode: SignalMode,
    pub synthesizer: SynthesizerConfig,
    pub tracker: TrackerConfig,
    pub schedule: ScheduleConfig,
}

const INTERVALS: &[&str] = &[
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

impl Default for SignalFileConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            interval: "30m".to_string(),
            candle_limit: 100,
            mode: SignalMode::Numeric,
            synthesizer: SynthesizerConfig::default(),
            tracker: TrackerConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl SignalFileConfig {
    /// Load and validate from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read '{path}': {e}")))?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{path}: {msg}")),
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(Error::Config("symbols must not be empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.symbols.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(Error::Config(format!("duplicate symbol '{dup}'")));
        }
        if !INTERVALS.contains(&self.interval.as_str()) {
            return Err(Error::Config(format!("unsupported interval '{}'", self.interval)));
        }
        if self.candle_limit < self.synthesizer.min_candles() {
            return Err(Error::Config(format!(
                "candle_limit {} is below the {} candles the synthesizer needs",
                self.candle_limit,
                self.synthesizer.min_candles()
            )));
        }
        self.synthesizer.validate().map_err(Error::Config)?;
        self.tracker.validate().map_err(Error::Config)?;
        self.schedule.validate().map_err(Error::Config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker::DedupPolicy;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = SignalFileConfig::from_toml("").unwrap();
        assert_eq!(cfg, SignalFileConfig::default());
    }

    #[test]
    fn full_file_round_trips_sections() {
        let cfg = SignalFileConfig::from_toml(
            r#"
            symbols = ["SOLUSDT"]
            interval = "1h"
            mode = "narrative"

            [synthesizer]
            rsi_period = 10
            score_threshold = 2

            [tracker]
            dedup = "price_drift"

            [schedule]
            days = ["Sun"]
            hours = [20]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.symbols, vec!["SOLUSDT".to_string()]);
        assert_eq!(cfg.mode, SignalMode::Narrative);
        assert_eq!(cfg.synthesizer.rsi_period, 10);
        assert_eq!(cfg.tracker.dedup, DedupPolicy::PriceDrift);
        assert_eq!(cfg.schedule.hours, vec![20]);
    }

    #[test]
    fn rejects_invalid_files() {
        assert!(SignalFileConfig::from_toml("symbols = []").is_err());
        assert!(SignalFileConfig::from_toml("symbols = [\"A\", \"A\"]").is_err());
        assert!(SignalFileConfig::from_toml("interval = \"7m\"").is_err());
        assert!(SignalFileConfig::from_toml("candle_limit = 10").is_err());
        assert!(SignalFileConfig::from_toml("unknown = 1").is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = SignalFileConfig::load("/nonexistent/signals.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn shipped_sample_is_valid() {
        let cfg = SignalFileConfig::from_toml(include_str!("../../../config/signals.toml")).unwrap();
        assert_eq!(cfg.symbols.len(), 5);
        assert_eq!(cfg.tracker.dedup, DedupPolicy::MaterialChange);
        assert!(!cfg.tracker.close_on_take_profit);
        assert_eq!(cfg.schedule.days.len(), 5);
    }
}

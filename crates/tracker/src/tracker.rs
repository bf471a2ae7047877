use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use common::{Alert, AlertMemory, Direction, OpenPosition, Signal};

use crate::store::{InMemoryStore, PositionStore};

/// How a new signal is compared against the last alert for its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Re-alert when direction flips or the entry moved more than `material_change_pct`.
    #[default]
    MaterialChange,
    /// Re-alert only when the live price drifted at least `price_drift_pct`
    /// from the price at the last alert, whatever the signal says.
    PriceDrift,
}

/// User-configurable tracker parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    pub dedup: DedupPolicy,
    /// Entry move, as a fraction of the live price, that counts as a new signal (0.005 = 0.5%).
    pub material_change_pct: f64,
    /// Live price drift needed before any re-alert under `PriceDrift` (0.003 = 0.3%).
    pub price_drift_pct: f64,
    /// Also close positions whose take-profit was reached. Off by default:
    /// positions otherwise end only on a stop-loss breach or replacement.
    pub close_on_take_profit: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dedup: DedupPolicy::MaterialChange,
            material_change_pct: 0.005,
            price_drift_pct: 0.003,
            close_on_take_profit: false,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.material_change_pct >= 0.0 && self.price_drift_pct >= 0.0) {
            return Err("material_change_pct and price_drift_pct must be >= 0".into());
        }
        Ok(())
    }
}

/// Per-symbol Flat/Open state machine.
///
/// Callers must run `check_exit` before `consider` for a symbol, and skip
/// `consider` when `check_exit` closed the position. Both take `&mut self`, so
/// sharing a tracker means locking it across the pair.
pub struct TradeTracker<S: PositionStore = InMemoryStore> {
    config: TrackerConfig,
    store: S,
}

impl TradeTracker<InMemoryStore> {
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_store(config, InMemoryStore::new())
    }
}

impl<S: PositionStore> TradeTracker<S> {
    pub fn with_store(config: TrackerConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn position(&self, symbol: &str) -> Option<OpenPosition> {
        self.store.position(symbol)
    }

    pub fn open_positions(&self) -> Vec<OpenPosition> {
        self.store.positions()
    }

    /// Close the symbol's position if `price` breached its stop-loss
    /// (or, when enabled, reached its take-profit). Flat symbols never exit.
    pub fn check_exit(&mut self, symbol: &str, price: f64) -> Option<Alert> {
        let position = self.store.position(symbol)?;

        if position.direction.stop_breached(price, position.stop_loss) {
            self.store.close(symbol);
            info!(
                symbol,
                direction = %position.direction,
                price,
                stop_loss = position.stop_loss,
                "Stop-loss breached, position invalidated"
            );
            return Some(Alert::stop_loss(&position, price));
        }

        if self.config.close_on_take_profit {
            let reached = match position.direction {
                Direction::Long => price >= position.take_profit,
                Direction::Short => price <= position.take_profit,
            };
            if reached {
                self.store.close(symbol);
                info!(
                    symbol,
                    direction = %position.direction,
                    price,
                    take_profit = position.take_profit,
                    "Take-profit reached, position closed"
                );
                return Some(Alert::take_profit(&position, price));
            }
        }

        None
    }

    /// Accept `signal` as the symbol's open position if it differs enough from
    /// the last alert, returning the alert to send. Otherwise nothing changes.
    pub fn consider(&mut self, signal: Signal, price: f64) -> Option<Alert> {
        let symbol = signal.symbol.as_str();

        if let Some(previous) = self.store.last_alert(symbol) {
            if !self.is_new(&previous, &signal, price) {
                debug!(
                    symbol,
                    direction = %signal.direction,
                    entry = signal.entry_price,
                    previous_entry = previous.entry_price,
                    policy = ?self.config.dedup,
                    "Signal suppressed as duplicate"
                );
                return None;
            }
        }

        self.store.open(OpenPosition::from(&signal));
        self.store.remember_alert(
            symbol,
            AlertMemory {
                direction: signal.direction,
                entry_price: signal.entry_price,
                alerted_price: price,
            },
        );
        info!(
            symbol,
            direction = %signal.direction,
            entry = signal.entry_price,
            stop_loss = signal.stop_loss,
            take_profit = signal.take_profit,
            score = signal.score,
            "Signal accepted"
        );
        Some(Alert::new_signal(&signal))
    }

    fn is_new(&self, previous: &AlertMemory, signal: &Signal, price: f64) -> bool {
        match self.config.dedup {
            DedupPolicy::MaterialChange => {
                previous.direction != signal.direction
                    || (signal.entry_price - previous.entry_price).abs()
                        > price * self.config.material_change_pct
            }
            DedupPolicy::PriceDrift => {
                (price - previous.alerted_price).abs() >= price * self.config.price_drift_pct
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

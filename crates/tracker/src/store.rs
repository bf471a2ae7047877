use std::collections::HashMap;

use common::{AlertMemory, OpenPosition};

/// Per-symbol open positions and alert memory, owned by the `TradeTracker`.
///
/// At most one position per symbol. `InMemoryStore` is the only implementation;
/// its contents are lost on restart.
pub trait PositionStore: Send + Sync {
    fn position(&self, symbol: &str) -> Option<OpenPosition>;

    /// Insert or replace the position for `position.symbol`.
    fn open(&mut self, position: OpenPosition);

    fn close(&mut self, symbol: &str) -> Option<OpenPosition>;

    fn last_alert(&self, symbol: &str) -> Option<AlertMemory>;

    fn remember_alert(&mut self, symbol: &str, memory: AlertMemory);

    /// All open positions, sorted by symbol.
    fn positions(&self) -> Vec<OpenPosition>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    positions: HashMap<String, OpenPosition>,
    alerts: HashMap<String, AlertMemory>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionStore for InMemoryStore {
    fn position(&self, symbol: &str) -> Option<OpenPosition> {
        self.positions.get(symbol).cloned()
    }

    fn open(&mut self, position: OpenPosition) {
        self.positions.insert(position.symbol.clone(), position);
    }

    fn close(&mut self, symbol: &str) -> Option<OpenPosition> {
        self.positions.remove(symbol)
    }

    fn last_alert(&self, symbol: &str) -> Option<AlertMemory> {
        self.alerts.get(symbol).copied()
    }

    fn remember_alert(&mut self, symbol: &str, memory: AlertMemory) {
        self.alerts.insert(symbol.to_string(), memory);
    }

    fn positions(&self) -> Vec<OpenPosition> {
        let mut all: Vec<OpenPosition> = self.positions.values().cloned().collect();
        all.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        all
    }
}

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use common::{Alert, Candle, Error, MarketDataSource, NarrativeGenerator, Result, Signal};
use strategy::synthesizer::market_summary;
use strategy::{parse_narrative, synthesize, SynthesizerConfig};
use tracker::TradeTracker;

use crate::config::{SignalFileConfig, SignalMode};

/// Runs one evaluation pass over the configured symbols.
///
/// Owns the trade tracker; the tracker is shared read-only with anything that
/// reports on open positions. Cycles run on the single engine task, so this is
/// the tracker's only writer: the lock is released while a signal is being
/// built (narrative calls can take seconds) and re-taken for `consider`
/// without another writer able to slip in between.
pub struct Evaluator {
    symbols: Vec<String>,
    mode: SignalMode,
    synthesizer: SynthesizerConfig,
    market: Arc<dyn MarketDataSource>,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
    tracker: Arc<RwLock<TradeTracker>>,
}

impl Evaluator {
    /// Fails if narrative mode is configured without a narrative generator.
    pub fn new(
        cfg: &SignalFileConfig,
        market: Arc<dyn MarketDataSource>,
        narrator: Option<Arc<dyn NarrativeGenerator>>,
    ) -> Result<Self> {
        if cfg.mode == SignalMode::Narrative && narrator.is_none() {
            return Err(Error::Config(
                "narrative mode requires a narrative generator (set OPENAI_API_KEY)".into(),
            ));
        }
        Ok(Self {
            symbols: cfg.symbols.clone(),
            mode: cfg.mode,
            synthesizer: cfg.synthesizer.clone(),
            market,
            narrator,
            tracker: Arc::new(RwLock::new(TradeTracker::new(cfg.tracker.clone()))),
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    pub fn tracker(&self) -> Arc<RwLock<TradeTracker>> {
        self.tracker.clone()
    }

    /// Evaluate every symbol in configured order and collect the alerts to send.
    ///
    /// A failure for one symbol is logged and skipped; it never aborts the cycle.
    pub async fn evaluate_cycle(&self) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let mut failures = 0usize;

        for symbol in &self.symbols {
            match self.evaluate_symbol(symbol).await {
                Ok(Some(alert)) => alerts.push(alert),
                Ok(None) => debug!(symbol = %symbol, "No alert this cycle"),
                Err(e) => {
                    failures += 1;
                    warn!(symbol = %symbol, error = %e, "Symbol evaluation failed, continuing");
                }
            }
        }

        info!(
            symbols = self.symbols.len(),
            alerts = alerts.len(),
            failures,
            "Evaluation cycle complete"
        );
        alerts
    }

    /// Fetch inputs, check for an exit, then build and consider a new signal.
    async fn evaluate_symbol(&self, symbol: &str) -> Result<Option<Alert>> {
        let candles = self.market.fetch_candles(symbol).await?;
        let price = self.market.fetch_live_price(symbol).await?;

        if !price.is_finite() || price <= 0.0 {
            return Err(Error::Exchange(format!("invalid live price {price}")));
        }
        if let Some(idx) = candles.iter().position(|c| !c.is_well_formed()) {
            return Err(Error::Exchange(format!("malformed candle at index {idx}")));
        }

        // An exit this cycle takes priority over opening anything new.
        if let Some(exit) = self.tracker.write().await.check_exit(symbol, price) {
            return Ok(Some(exit));
        }

        let signal = match self.mode {
            SignalMode::Numeric => synthesize(symbol, &candles, price, &self.synthesizer),
            SignalMode::Narrative => self.narrate(symbol, &candles, price).await?,
        };
        let Some(signal) = signal else {
            return Ok(None);
        };

        // A narrated entry can lag the market; never open a trade that is already stopped out.
        if signal.direction.stop_breached(price, signal.stop_loss) {
            debug!(
                symbol,
                direction = %signal.direction,
                price,
                stop_loss = signal.stop_loss,
                "Live price already beyond signal stop-loss, dropping"
            );
            return Ok(None);
        }

        Ok(self.tracker.write().await.consider(signal, price))
    }

    async fn narrate(&self, symbol: &str, candles: &[Candle], price: f64) -> Result<Option<Signal>> {
        let Some(narrator) = &self.narrator else {
            return Err(Error::Config("no narrative generator configured".into()));
        };
        let Some(summary) = market_summary(symbol, candles, price, &self.synthesizer) else {
            debug!(symbol, candles = candles.len(), "Insufficient data for narrative");
            return Ok(None);
        };
        let text = narrator.generate(&summary).await?;
        Ok(parse_narrative(symbol, &text))
    }
}

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use common::{AlertSink, EngineCommand, EngineState, OpenPosition};
use tracker::TradeTracker;

use crate::config::SignalMode;
use crate::cycle::Evaluator;
use crate::schedule::ScheduleConfig;

/// Cloneable handle passed to other crates (Telegram).
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    state: Arc<RwLock<EngineState>>,
    tracker: Arc<RwLock<TradeTracker>>,
    symbols: Arc<Vec<String>>,
    mode: SignalMode,
}

impl EngineHandle {
    pub async fn send(&self, cmd: EngineCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    pub async fn open_positions(&self) -> Vec<OpenPosition> {
        self.tracker.read().await.open_positions()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn mode(&self) -> SignalMode {
        self.mode
    }
}

/// The scheduler loop: run a cycle, sleep, repeat.
///
/// Cycles run on this one task, so they never overlap. Commands are handled
/// while sleeping; `EvaluateNow` runs a cycle in place of waiting.
pub struct Engine {
    evaluator: Evaluator,
    schedule: ScheduleConfig,
    sink: Arc<dyn AlertSink>,
    state: Arc<RwLock<EngineState>>,
    command_rx: mpsc::Receiver<EngineCommand>,
    #[allow(dead_code)] // kept to prevent channel close
    command_tx: mpsc::Sender<EngineCommand>,
}

impl Engine {
    pub fn new(
        evaluator: Evaluator,
        schedule: ScheduleConfig,
        sink: Arc<dyn AlertSink>,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let state = Arc::new(RwLock::new(EngineState::Running));

        let handle = EngineHandle {
            command_tx: command_tx.clone(),
            state: state.clone(),
            tracker: evaluator.tracker(),
            symbols: Arc::new(evaluator.symbols().to_vec()),
            mode: evaluator.mode(),
        };

        let engine = Engine {
            evaluator,
            schedule,
            sink,
            state,
            command_rx,
            command_tx,
        };

        (engine, handle)
    }

    /// Run the engine. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(
            symbols = ?self.evaluator.symbols(),
            interval_secs = self.schedule.poll_interval_secs,
            "Engine running"
        );

        loop {
            let state = *self.state.read().await;
            if state != EngineState::Running {
                debug!("Engine paused, skipping scheduled cycle");
            } else if !self.schedule.is_open(&Local::now()) {
                debug!("Outside analysis window, skipping scheduled cycle");
            } else {
                self.run_cycle().await;
            }

            let sleep = tokio::time::sleep(self.schedule.poll_interval());
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    cmd = self.command_rx.recv() => match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            warn!("Engine command channel closed, shutting down");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn handle_command(&self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Pause => {
                let mut state = self.state.write().await;
                if *state == EngineState::Running {
                    info!("Engine paused, scheduled cycles suppressed");
                    *state = EngineState::Paused;
                }
            }
            EngineCommand::Resume => {
                let mut state = self.state.write().await;
                if *state == EngineState::Paused {
                    info!("Engine resumed");
                    *state = EngineState::Running;
                }
            }
            EngineCommand::EvaluateNow => {
                info!("Manual evaluation requested");
                self.run_cycle().await;
            }
        }
    }

    /// Evaluate all symbols and deliver the alerts. Returns how many were delivered.
    pub async fn run_cycle(&self) -> usize {
        let alerts = self.evaluator.evaluate_cycle().await;
        let mut delivered = 0;
        for alert in &alerts {
            match self.sink.send(alert).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(symbol = %alert.symbol, kind = ?alert.kind, error = %e, "Alert delivery failed")
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::SignalFileConfig;
    use crate::testing::{long_setup, MockMarket, RecordingSink, LONG_SETUP_PRICE};

    fn evaluator() -> Evaluator {
        let cfg = SignalFileConfig {
            symbols: vec!["BTCUSDT".into()],
            ..SignalFileConfig::default()
        };
        let market = Arc::new(MockMarket::with(&["BTCUSDT"], long_setup(), LONG_SETUP_PRICE));
        Evaluator::new(&cfg, market, None).unwrap()
    }

    #[tokio::test]
    async fn run_cycle_delivers_alerts() {
        let sink = Arc::new(RecordingSink::default());
        let (engine, handle) = Engine::new(evaluator(), ScheduleConfig::default(), sink.clone());

        assert_eq!(engine.run_cycle().await, 1);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
        assert_eq!(handle.open_positions().await.len(), 1);
        assert_eq!(handle.symbols(), ["BTCUSDT".to_string()]);
    }

    #[tokio::test]
    async fn delivery_failure_is_not_fatal() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let (engine, handle) = Engine::new(evaluator(), ScheduleConfig::default(), sink);
        assert_eq!(engine.run_cycle().await, 0);
        // the position is still tracked even though the alert did not go out
        assert_eq!(handle.open_positions().await.len(), 1);
    }

    #[tokio::test]
    async fn pause_resume_and_manual_evaluation() {
        let sink = Arc::new(RecordingSink::default());
        let schedule = ScheduleConfig {
            poll_interval_secs: 3600,
            // hour 25 never matches, so only EvaluateNow produces alerts
            hours: vec![25],
            days: vec![],
        };
        let (engine, handle) = Engine::new(evaluator(), schedule, sink.clone());
        handle.send(EngineCommand::Pause).await;
        let task = tokio::spawn(engine.run());

        tokio::time::timeout(Duration::from_secs(1), async {
            while handle.state().await != EngineState::Paused {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("paused");

        handle.send(EngineCommand::Resume).await;
        handle.send(EngineCommand::EvaluateNow).await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while handle.open_positions().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("manual cycle ran");

        assert_eq!(handle.state().await, EngineState::Running);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
        task.abort();
    }
}

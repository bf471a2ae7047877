use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{AlertSink, Config, MarketDataSource, NarrativeGenerator};
use engine::{BinanceMarketData, Engine, Evaluator, OpenAiNarrator, SignalFileConfig};
use telegram_ctrl::{start_bot, BotDeps, TelegramSink};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let signal_file = SignalFileConfig::load(&cfg.signal_config_path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {e}", cfg.signal_config_path));
    info!(
        mode = ?signal_file.mode,
        symbols = ?signal_file.symbols,
        interval = %signal_file.interval,
        "Signal bot starting"
    );

    // ── Collaborators ─────────────────────────────────────────────────────────
    let market: Arc<dyn MarketDataSource> = Arc::new(
        BinanceMarketData::new(signal_file.interval.clone(), signal_file.candle_limit)
            .unwrap_or_else(|e| panic!("Failed to build market data client: {e}")),
    );

    let narrator: Option<Arc<dyn NarrativeGenerator>> = match &cfg.openai_api_key {
        Some(key) => {
            let client = OpenAiNarrator::new(key.clone(), cfg.openai_model.clone())
                .unwrap_or_else(|e| panic!("Failed to build narrative client: {e}"));
            Some(Arc::new(client))
        }
        None => {
            warn!("OPENAI_API_KEY not set, narrative mode unavailable");
            None
        }
    };

    let sink: Arc<dyn AlertSink> =
        Arc::new(TelegramSink::new(cfg.telegram_token.clone(), &cfg.telegram_chat_ids));

    // ── Engine ────────────────────────────────────────────────────────────────
    let evaluator = Evaluator::new(&signal_file, market, narrator)
        .unwrap_or_else(|e| panic!("Invalid configuration: {e}"));
    let (engine, engine_handle) = Engine::new(evaluator, signal_file.schedule.clone(), sink);

    // ── Telegram C2 ───────────────────────────────────────────────────────────
    let bot_deps = BotDeps {
        engine: engine_handle,
        allowed_user_ids: Arc::new(cfg.telegram_chat_ids.clone()),
    };

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    tokio::spawn(engine.run());
    tokio::spawn(start_bot(cfg.telegram_token.clone(), bot_deps));

    // Keep main alive
    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Exiting.");
}

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    utils::command::BotCommands,
};
use tracing::{info, warn};

use common::{Alert, AlertSink, EngineCommand, EngineState, Error, OpenPosition, Result};
use engine::{EngineHandle, SignalMode};

type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub engine: EngineHandle,
    pub allowed_user_ids: Arc<Vec<i64>>,
}

/// Telegram bot commands exposed to the operator.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Signal bot commands:")]
pub enum Command {
    #[command(description = "Show this help")]
    Help,
    #[command(description = "Show engine state, mode and watched symbols")]
    Status,
    #[command(description = "List open signals awaiting invalidation")]
    Signals,
    #[command(description = "Suspend scheduled evaluations")]
    Pause,
    #[command(description = "Resume scheduled evaluations")]
    Resume,
    #[command(description = "Evaluate all symbols now")]
    Now,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(token: String, deps: BotDeps) {
    let bot = Bot::new(token);
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(handle_help))
        .branch(case![Command::Status].endpoint(handle_status))
        .branch(case![Command::Signals].endpoint(handle_signals))
        .branch(case![Command::Pause].endpoint(handle_pause))
        .branch(case![Command::Resume].endpoint(handle_resume))
        .branch(case![Command::Now].endpoint(handle_now));

    Update::filter_message()
        .filter_map(|msg: Message| msg.from().map(|u| u.id))
        .filter_async(auth_filter)
        .branch(command_handler)
}

/// Silently drop messages from users not in the allowed list.
async fn auth_filter(user_id: UserId, deps: Arc<BotDeps>) -> bool {
    let uid = user_id.0 as i64;
    let allowed = deps.allowed_user_ids.contains(&uid);
    if !allowed {
        warn!(user_id = uid, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn handle_help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
    Ok(())
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let state = deps.engine.state().await;
    let open = deps.engine.open_positions().await.len();
    let text = format_status(state, deps.engine.mode(), deps.engine.symbols(), open);
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_signals(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let positions = deps.engine.open_positions().await;
    bot.send_message(msg.chat.id, format_positions(&positions)).await?;
    Ok(())
}

async fn handle_pause(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    if deps.engine.state().await == EngineState::Paused {
        bot.send_message(msg.chat.id, "Evaluations are already paused.").await?;
    } else {
        deps.engine.send(EngineCommand::Pause).await;
        bot.send_message(msg.chat.id, "Scheduled evaluations paused.").await?;
    }
    Ok(())
}

async fn handle_resume(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    if deps.engine.state().await == EngineState::Running {
        bot.send_message(msg.chat.id, "Evaluations are already running.").await?;
    } else {
        deps.engine.send(EngineCommand::Resume).await;
        bot.send_message(msg.chat.id, "Scheduled evaluations resumed.").await?;
    }
    Ok(())
}

async fn handle_now(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    deps.engine.send(EngineCommand::EvaluateNow).await;
    bot.send_message(msg.chat.id, "Evaluating all symbols\u{2026}").await?;
    Ok(())
}

fn format_status(state: EngineState, mode: SignalMode, symbols: &[String], open: usize) -> String {
    let mode = match mode {
        SignalMode::Numeric => "numeric",
        SignalMode::Narrative => "narrative",
    };
    format!(
        "Signal Bot Status\n\
         Engine: {state}\n\
         Mode: {mode}\n\
         Symbols: {}\n\
         Open signals: {open}",
        symbols.join(", ")
    )
}

fn format_positions(positions: &[OpenPosition]) -> String {
    if positions.is_empty() {
        return "No open signals.".to_string();
    }
    positions
        .iter()
        .map(|p| {
            format!(
                "{} {} entry {:.4} | SL {:.4} | TP {:.4} (since {})",
                p.symbol,
                p.direction,
                p.entry_price,
                p.stop_loss,
                p.take_profit,
                p.opened_at.format("%Y-%m-%d %H:%M UTC")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Delivers alerts to every configured chat.
pub struct TelegramSink {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl TelegramSink {
    pub fn new(token: impl Into<String>, chat_ids: &[i64]) -> Self {
        Self {
            bot: Bot::new(token),
            chat_ids: chat_ids.iter().map(|&id| ChatId(id)).collect(),
        }
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    /// Succeeds if at least one chat received the alert.
    async fn send(&self, alert: &Alert) -> Result<()> {
        let mut delivered = 0usize;
        let mut last_error = None;
        for &chat_id in &self.chat_ids {
            match self.bot.send_message(chat_id, alert.message.as_str()).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert");
                    last_error = Some(e.to_string());
                }
            }
        }
        match (delivered, last_error) {
            (0, Some(e)) => Err(Error::Alert(e)),
            (0, None) => Err(Error::Alert("no chat ids configured".into())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Direction;

    #[test]
    fn status_lists_symbols_and_counts() {
        let text = format_status(
            EngineState::Paused,
            SignalMode::Numeric,
            &["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            1,
        );
        assert!(text.contains("Engine: paused"));
        assert!(text.contains("Mode: numeric"));
        assert!(text.contains("Symbols: BTCUSDT, ETHUSDT"));
        assert!(text.contains("Open signals: 1"));
    }

    #[test]
    fn positions_render_one_per_line() {
        assert_eq!(format_positions(&[]), "No open signals.");
        let opened_at = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let positions = vec![
            OpenPosition {
                symbol: "BTCUSDT".into(),
                direction: Direction::Long,
                entry_price: 100.0,
                stop_loss: 98.0,
                take_profit: 103.0,
                opened_at,
            },
            OpenPosition {
                symbol: "ETHUSDT".into(),
                direction: Direction::Short,
                entry_price: 10.0,
                stop_loss: 10.5,
                take_profit: 9.25,
                opened_at,
            },
        ];
        let text = format_positions(&positions);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("BTCUSDT LONG entry 100.0000 | SL 98.0000 | TP 103.0000"));
        assert!(lines[1].contains("2023-11-14 22:13 UTC"));
    }
}

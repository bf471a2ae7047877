pub mod commands;

pub use commands::{start_bot, BotDeps, TelegramSink};

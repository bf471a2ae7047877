pub mod binance;
pub mod config;
pub mod cycle;
pub mod lifecycle;
pub mod openai;
pub mod schedule;

#[cfg(test)]
pub(crate) mod testing;

pub use binance::BinanceMarketData;
pub use config::{SignalFileConfig, SignalMode};
pub use cycle::Evaluator;
pub use lifecycle::{Engine, EngineHandle};
pub use openai::OpenAiNarrator;
pub use schedule::ScheduleConfig;

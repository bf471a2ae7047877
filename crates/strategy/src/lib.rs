pub mod config;
pub mod indicators;
pub mod narrative;
pub mod synthesizer;

pub use config::SynthesizerConfig;
pub use indicators::{IndicatorSnapshot, PatternTag};
pub use narrative::parse_narrative;
pub use synthesizer::synthesize;

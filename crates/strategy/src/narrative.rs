//! Labelled-field extraction from narrative generator output.
//!
//! Recognised labels (case-insensitive, optional `:`/`=`, markdown bold ignored):
//! `Direction: Long|Short`, `Entry: <n>`, `SL|Stop|Stop-loss: <n>`,
//! `TP|Take-profit|Target: <n>`, and optionally `Score|Quality: <1-10>`.
//! The direction token must end its line or be followed by punctuation.
//! All four required fields must parse or no signal is produced.

use std::sync::LazyLock;

use common::{Direction, Signal};
use regex::Regex;
use tracing::debug;

macro_rules! re {
    ($pat:expr) => {
        LazyLock::new(|| Regex::new($pat).unwrap())
    };
}

static RE_DIRECTION: LazyLock<Regex> =
    re!(r"(?im)\bdirection\b\s*[:=]?\s*(long|short)[ \t\r]*(?:$|[.,;(])");
static RE_ENTRY: LazyLock<Regex> =
    re!(r"(?i)\bentry(?:\s+price)?\b\s*[:=]?\s*\$?([0-9][0-9,]*(?:\.[0-9]+)?)");
static RE_STOP: LazyLock<Regex> =
    re!(r"(?i)\b(?:sl|stop[\s-]?loss|stop)\b\s*[:=]?\s*\$?([0-9][0-9,]*(?:\.[0-9]+)?)");
static RE_TARGET: LazyLock<Regex> =
    re!(r"(?i)\b(?:tp|take[\s-]?profit|target)\b\s*[:=]?\s*\$?([0-9][0-9,]*(?:\.[0-9]+)?)");
static RE_SCORE: LazyLock<Regex> =
    re!(r"(?i)\b(?:quality|score)(?:\s+score)?\b\s*[:=]?\s*([0-9]{1,2})\b");

fn extract_price(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn extract_direction(text: &str) -> Option<Direction> {
    let token = RE_DIRECTION.captures(text)?.get(1)?.as_str().to_lowercase();
    match token.as_str() {
        "long" => Some(Direction::Long),
        "short" => Some(Direction::Short),
        _ => None,
    }
}

fn extract_score(text: &str) -> u32 {
    RE_SCORE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|s| (1..=10).contains(s))
        .unwrap_or(0)
}

/// Parse a narrative into a `Signal`, or `None` if any required field is
/// missing, non-numeric, or the levels are on the wrong side of the entry.
pub fn parse_narrative(symbol: &str, text: &str) -> Option<Signal> {
    let plain = text.replace('*', "");

    let direction = extract_direction(&plain);
    let entry = extract_price(&RE_ENTRY, &plain);
    let stop = extract_price(&RE_STOP, &plain);
    let target = extract_price(&RE_TARGET, &plain);

    let (Some(direction), Some(entry_price), Some(stop_loss), Some(take_profit)) =
        (direction, entry, stop, target)
    else {
        debug!(
            symbol,
            direction = direction.is_some(),
            entry = entry.is_some(),
            stop = stop.is_some(),
            target = target.is_some(),
            "Narrative missing required fields"
        );
        return None;
    };

    let signal = Signal {
        symbol: symbol.to_string(),
        direction,
        entry_price,
        stop_loss,
        take_profit,
        score: extract_score(&plain),
        reasons: plain
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
    };

    if !signal.is_coherent() {
        debug!(symbol, %direction, entry_price, stop_loss, take_profit, "Narrative levels incoherent");
        return None;
    }
    Some(signal)
}

use common::{AlertKind, Direction, Signal};
use proptest::prelude::*;
use tracker::{TrackerConfig, TradeTracker};

fn long_signal(symbol: &str, entry: f64) -> Signal {
    Signal {
        symbol: symbol.into(),
        direction: Direction::Long,
        entry_price: entry,
        stop_loss: entry * 0.98,
        take_profit: entry * 1.03,
        score: 3,
        reasons: vec![],
    }
}

proptest! {
    /// A position exits at most once, and only while it is open.
    #[test]
    fn exits_fire_at_most_once_per_position(
        entry in 1.0f64..100_000.0,
        moves in prop::collection::vec(-0.05f64..0.05, 1..50),
    ) {
        let mut tracker = TradeTracker::new(TrackerConfig::default());
        prop_assert!(tracker.consider(long_signal("TESTUSDT", entry), entry).is_some());

        let mut exits = 0;
        for m in moves {
            let price = entry * (1.0 + m);
            let was_open = tracker.position("TESTUSDT").is_some();
            if let Some(alert) = tracker.check_exit("TESTUSDT", price) {
                prop_assert!(was_open);
                prop_assert!(matches!(alert.kind, AlertKind::StopLoss | AlertKind::TakeProfit));
                exits += 1;
            }
        }
        prop_assert!(exits <= 1);
        prop_assert!(tracker.open_positions().len() <= 1);
    }

    /// Re-submitting the accepted signal never re-alerts under the default policy.
    #[test]
    fn identical_signal_is_always_suppressed(entry in 1.0f64..100_000.0) {
        let mut tracker = TradeTracker::new(TrackerConfig::default());
        tracker.consider(long_signal("TESTUSDT", entry), entry);
        prop_assert!(tracker.consider(long_signal("TESTUSDT", entry), entry).is_none());
    }
}

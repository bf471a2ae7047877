/// Arithmetic mean of the trailing `period` volumes; `0.0` if fewer exist.
pub fn average_volume(volumes: &[f64], period: usize) -> f64 {
    if period == 0 || volumes.len() < period {
        return 0.0;
    }
    volumes[volumes.len() - period..].iter().sum::<f64>() / period as f64
}

/// `last > multiplier * avg`, false when no average is available.
pub fn is_volume_spike(last: f64, avg: f64, multiplier: f64) -> bool {
    avg > 0.0 && last > multiplier * avg
}

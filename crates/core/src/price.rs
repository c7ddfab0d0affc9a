//! Price band data returned by the quote provider.

use serde::{Deserialize, Serialize};

/// High/low band of the most recent short-timeframe candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleRange {
    pub high: f64,
    pub low: f64,
}

impl CandleRange {
    pub fn new(high: f64, low: f64) -> Self {
        Self { high, low }
    }

    /// Whether a price lies inside the band. Both ends inclusive, so a
    /// target equal to the candle high or low counts as traded through.
    #[inline]
    pub fn contains(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_inside() {
        let range = CandleRange::new(101.0, 99.0);
        assert!(range.contains(100.0));
    }

    #[test]
    fn test_contains_is_inclusive_at_bounds() {
        let range = CandleRange::new(101.0, 99.0);
        assert!(range.contains(99.0));
        assert!(range.contains(101.0));
    }

    #[test]
    fn test_contains_outside() {
        let range = CandleRange::new(101.0, 99.0);
        assert!(!range.contains(98.999));
        assert!(!range.contains(101.001));
    }

    #[test]
    fn test_contains_negative_targets() {
        // Spread instruments can trade below zero; nothing clamps at 0.
        let range = CandleRange::new(-1.0, -3.0);
        assert!(range.contains(-2.0));
        assert!(!range.contains(0.0));
    }
}

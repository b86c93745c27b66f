use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use common::{Candle, Error, Result};

/// Default trailing window for support/resistance.
pub const DEFAULT_LEVEL_WINDOW: usize = 50;

/// The two price-grid lines bracketing a price.
///
/// Grid spacing depends on the price tier: 100 above 1000, 0.5 above 100,
/// 0.005 otherwise. Invariant: `lower <= price < upper` and
/// `upper - lower == increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundNumberPair {
    pub lower: Decimal,
    pub upper: Decimal,
    pub increment: Decimal,
}

impl RoundNumberPair {
    pub fn increment_for(price: Decimal) -> Decimal {
        if price > dec!(1000) {
            dec!(100)
        } else if price > dec!(100) {
            dec!(0.5)
        } else {
            dec!(0.005)
        }
    }

    pub fn locate(price: Decimal) -> Result<Self> {
        if price <= Decimal::ZERO {
            return Err(Error::InvalidPrice(format!("price must be positive, got {price}")));
        }
        let increment = Self::increment_for(price);
        let lower = (price / increment).floor() * increment;
        Ok(Self {
            lower,
            upper: lower + increment,
            increment,
        })
    }

    pub fn midpoint(&self) -> Decimal {
        (self.lower + self.upper) / Decimal::TWO
    }
}

/// Trailing support (lowest low) and resistance (highest high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub support: Decimal,
    pub resistance: Decimal,
}

/// A level computed from possibly fewer candles than requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelReading {
    pub level: Level,
    /// Candles the level was computed from.
    pub candles: usize,
    /// Fewer candles than the requested window were available.
    pub degraded: bool,
}

impl Level {
    /// Level over the last `window` candles. Fails when fewer exist.
    pub fn locate(candles: &[Candle], window: usize) -> Result<Level> {
        if window == 0 || candles.len() < window {
            return Err(Error::InsufficientData(format!(
                "level window needs {window} candles, got {}",
                candles.len()
            )));
        }
        Ok(Self::over(&candles[candles.len() - window..]))
    }

    /// Like [`Level::locate`] but proceeds with whatever is available,
    /// flagging the reading as degraded. `None` only for no candles.
    pub fn locate_partial(candles: &[Candle], window: usize) -> Option<LevelReading> {
        if candles.is_empty() {
            return None;
        }
        let take = window.clamp(1, candles.len());
        Some(LevelReading {
            level: Self::over(&candles[candles.len() - take..]),
            candles: take,
            degraded: take < window,
        })
    }

    fn over(candles: &[Candle]) -> Level {
        let support = candles.iter().map(|c| c.low).min().unwrap_or_default();
        let resistance = candles.iter().map(|c| c.high).max().unwrap_or_default();
        Level { support, resistance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(i: i64, low: Decimal, high: Decimal) -> Candle {
        Candle::new(low, high, low, high, Utc.timestamp_opt(i * 60, 0).unwrap())
    }

    #[test]
    fn tiers_match_fixed_grid() {
        let p = RoundNumberPair::locate(dec!(1.1205)).unwrap();
        assert_eq!((p.lower, p.upper), (dec!(1.120), dec!(1.125)));

        let p = RoundNumberPair::locate(dec!(250.3)).unwrap();
        assert_eq!((p.lower, p.upper), (dec!(250.0), dec!(250.5)));

        let p = RoundNumberPair::locate(dec!(43250)).unwrap();
        assert_eq!((p.lower, p.upper), (dec!(43200), dec!(43300)));
    }

    #[test]
    fn tier_boundaries_are_exact() {
        // 1000 belongs to the 0.5 tier, 100 to the 0.005 tier
        let p = RoundNumberPair::locate(dec!(1000)).unwrap();
        assert_eq!((p.lower, p.increment), (dec!(1000), dec!(0.5)));

        let p = RoundNumberPair::locate(dec!(100)).unwrap();
        assert_eq!((p.lower, p.increment), (dec!(100), dec!(0.005)));

        // a price sitting on a grid line is its own lower bound
        let p = RoundNumberPair::locate(dec!(1.125)).unwrap();
        assert_eq!(p.lower, dec!(1.125));
        assert_eq!(p.upper, dec!(1.130));
    }

    #[test]
    fn non_positive_price_rejected() {
        assert!(matches!(
            RoundNumberPair::locate(Decimal::ZERO),
            Err(Error::InvalidPrice(_))
        ));
        assert!(RoundNumberPair::locate(dec!(-1.2)).is_err());
    }

    #[test]
    fn level_uses_trailing_window() {
        let candles = vec![
            bar(0, dec!(0.5), dec!(9.0)),
            bar(1, dec!(1.0), dec!(2.0)),
            bar(2, dec!(1.5), dec!(3.0)),
        ];
        let level = Level::locate(&candles, 2).unwrap();
        assert_eq!(level.support, dec!(1.0));
        assert_eq!(level.resistance, dec!(3.0));
    }

    #[test]
    fn undersized_window_is_insufficient_data() {
        let candles = vec![bar(0, dec!(1), dec!(2))];
        assert!(matches!(
            Level::locate(&candles, DEFAULT_LEVEL_WINDOW),
            Err(Error::InsufficientData(_))
        ));

        let reading = Level::locate_partial(&candles, DEFAULT_LEVEL_WINDOW).unwrap();
        assert!(reading.degraded);
        assert_eq!(reading.candles, 1);
        assert!(Level::locate_partial(&[], 5).is_none());
    }
}

pub mod moving_average;
pub mod rsi;

pub use moving_average::{ema, sma, AverageKind};
pub use rsi::RsiIndicator;

use common::{Candle, IndicatorSnapshot};
use serde::{Deserialize, Serialize};

/// Periods used when indicators are derived from candle history instead of
/// being supplied by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub fast_period: usize,
    pub slow_period: usize,
    pub average: AverageKind,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            fast_period: 10,
            slow_period: 50,
            average: AverageKind::Sma,
        }
    }
}

impl IndicatorSettings {
    /// Snapshot as of the last candle in `candles` (oldest first).
    /// `None` for an empty slice; individual indicators are `None` until
    /// their period is covered.
    pub fn derive_snapshot(&self, candles: &[Candle]) -> Option<IndicatorSnapshot> {
        let last = candles.last()?;
        let closes: Vec<_> = candles.iter().map(|c| c.close).collect();
        Some(IndicatorSnapshot {
            price: last.close,
            rsi: RsiIndicator::new(self.rsi_period.max(2)).compute(&closes),
            sma_fast: self.average.compute(&closes, self.fast_period),
            sma_slow: self.average.compute(&closes, self.slow_period),
        })
    }

    /// Snapshot as of every candle in `candles`: entry `k` equals
    /// `derive_snapshot(&candles[..=k])`. RSI is carried forward in one
    /// pass; the averages only read their trailing period.
    pub fn derive_snapshots(&self, candles: &[Candle]) -> Vec<IndicatorSnapshot> {
        let closes: Vec<_> = candles.iter().map(|c| c.close).collect();
        let rsi = RsiIndicator::new(self.rsi_period.max(2)).series(&closes);
        rsi.into_iter()
            .enumerate()
            .map(|(k, rsi)| {
                let prefix = &closes[..=k];
                IndicatorSnapshot {
                    price: closes[k],
                    rsi,
                    sma_fast: self.average.compute(prefix, self.fast_period),
                    sma_slow: self.average.compute(prefix, self.slow_period),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candles(n: i64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let p = dec!(100) + Decimal::from(i);
                Candle::new(p, p, p, p, Utc.timestamp_opt(i * 60, 0).unwrap())
            })
            .collect()
    }

    #[test]
    fn snapshot_degrades_with_short_history() {
        let settings = IndicatorSettings::default();
        let snap = settings.derive_snapshot(&candles(12)).unwrap();
        assert_eq!(snap.price, dec!(111));
        assert!(snap.rsi.is_none());
        assert_eq!(snap.sma_fast, Some(dec!(106.5)));
        assert!(snap.sma_slow.is_none());
    }

    #[test]
    fn snapshot_complete_with_long_history() {
        let snap = IndicatorSettings::default().derive_snapshot(&candles(60)).unwrap();
        assert_eq!(snap.rsi, Some(dec!(100)));
        assert!(snap.sma_fast.unwrap() > snap.sma_slow.unwrap());
    }

    #[test]
    fn empty_history_has_no_snapshot() {
        assert!(IndicatorSettings::default().derive_snapshot(&[]).is_none());
        assert!(IndicatorSettings::default().derive_snapshots(&[]).is_empty());
    }

    #[test]
    fn per_candle_snapshots_match_prefix_derivation() {
        // up 3, down 2: RSI moves off 100 once losses appear
        let history: Vec<Candle> = (0..70i64)
            .map(|i| {
                let p = dec!(100) + Decimal::from(i / 5 * 3 + [0, 3, 1, 4, 2][(i % 5) as usize]);
                Candle::new(p, p, p, p, Utc.timestamp_opt(i * 60, 0).unwrap())
            })
            .collect();
        for average in [AverageKind::Sma, AverageKind::Ema] {
            let settings = IndicatorSettings { average, ..IndicatorSettings::default() };
            let all = settings.derive_snapshots(&history);
            assert_eq!(all.len(), history.len());
            for (k, snap) in all.iter().enumerate() {
                assert_eq!(Some(snap), settings.derive_snapshot(&history[..=k]).as_ref(), "bar {k}");
            }
            assert!(all[69].rsi.is_some_and(|r| r > Decimal::ZERO && r < dec!(100)));
        }
    }
}

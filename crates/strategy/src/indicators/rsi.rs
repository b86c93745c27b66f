use std::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// RSI (Relative Strength Index) indicator.
///
/// Uses Wilder's smoothed moving average (same as TradingView / standard RSI).
/// Returns `None` until at least `period + 1` closed price values are available.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        Self { period }
    }

    /// Compute RSI from a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `period + 1` values.
    pub fn compute(&self, closes: &[Decimal]) -> Option<Decimal> {
        if closes.len() < self.period + 1 {
            return None;
        }
        self.series(closes).pop().flatten()
    }

    /// RSI as of every value in `closes`, in one pass. Entry `k` is what
    /// [`RsiIndicator::compute`] returns for `closes[..=k]`.
    pub fn series(&self, closes: &[Decimal]) -> Vec<Option<Decimal>> {
        let period = Decimal::from(self.period);
        let mut out = Vec::with_capacity(closes.len());
        let (mut avg_gain, mut avg_loss) = (Decimal::ZERO, Decimal::ZERO);

        for k in 0..closes.len() {
            if k == 0 {
                out.push(None);
                continue;
            }
            let change = closes[k] - closes[k - 1];
            match k.cmp(&self.period) {
                // first `period` changes accumulate into the initial average
                Ordering::Less => {
                    avg_gain += gain(change);
                    avg_loss += loss(change);
                    out.push(None);
                }
                Ordering::Equal => {
                    avg_gain = (avg_gain + gain(change)) / period;
                    avg_loss = (avg_loss + loss(change)) / period;
                    out.push(Some(rsi_value(avg_gain, avg_loss)));
                }
                Ordering::Greater => {
                    avg_gain = (avg_gain * (period - Decimal::ONE) + gain(change)) / period;
                    avg_loss = (avg_loss * (period - Decimal::ONE) + loss(change)) / period;
                    out.push(Some(rsi_value(avg_gain, avg_loss)));
                }
            }
        }
        out
    }
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return dec!(100);
    }
    let rs = avg_gain / avg_loss;
    (dec!(100) - dec!(100) / (Decimal::ONE + rs)).round_dp(8)
}

fn gain(change: Decimal) -> Decimal {
    change.max(Decimal::ZERO)
}

fn loss(change: Decimal) -> Decimal {
    (-change).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<Decimal> {
        values.iter().map(|v| common::price_from_f64(*v).unwrap()).collect()
    }

    #[test]
    fn rsi_returns_none_when_insufficient_data() {
        let rsi = RsiIndicator::new(14);
        // Need at least period+1 = 15 values
        let prices = vec![dec!(100); 14];
        assert!(rsi.compute(&prices).is_none());
    }

    #[test]
    fn rsi_returns_some_with_sufficient_data() {
        let rsi = RsiIndicator::new(14);
        let prices: Vec<Decimal> = (0..15).map(|i| dec!(100) + Decimal::from(i)).collect();
        assert!(rsi.compute(&prices).is_some());
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let rsi = RsiIndicator::new(3);
        let prices = series(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        assert_eq!(rsi.compute(&prices), Some(dec!(100)));
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = RsiIndicator::new(3);
        let prices = series(&[14.0, 13.0, 12.0, 11.0, 10.0]);
        assert_eq!(rsi.compute(&prices), Some(Decimal::ZERO));
    }

    #[test]
    fn rsi_balanced_moves_is_50() {
        let rsi = RsiIndicator::new(2);
        // one gain and one equal loss
        let prices = series(&[10.0, 11.0, 10.0]);
        assert_eq!(rsi.compute(&prices), Some(dec!(50)));
    }

    #[test]
    fn series_matches_compute_on_every_prefix() {
        let rsi = RsiIndicator::new(5);
        let prices = series(&[
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
        ]);
        let all = rsi.series(&prices);
        assert_eq!(all.len(), prices.len());
        assert!(all[..5].iter().all(Option::is_none));
        assert!(rsi.series(&[]).is_empty());
        for k in 0..prices.len() {
            assert_eq!(all[k], rsi.compute(&prices[..=k]), "prefix ending at {k}");
        }
    }

    #[test]
    fn rsi_known_series_in_range() {
        let rsi = RsiIndicator::new(14);
        let prices = series(&[
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09,
        ]);
        let v = rsi.compute(&prices).unwrap();
        assert!(v > Decimal::ZERO && v < dec!(100), "RSI out of range: {v}");
    }
}

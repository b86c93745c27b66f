use serde::Serialize;

use common::{CandleSeries, Signal};

/// Result of checking a signal against later price action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    /// Not enough later candles yet, or the signal has no direction.
    Pending,
}

/// Hook for judging whether a signal played out.
pub trait OutcomeEvaluator: Send + Sync {
    fn evaluate(&self, signal: &Signal, series: &CandleSeries) -> Outcome;
}

/// Compares the close `horizon` bars after the signal bar with the signal
/// bar's close. A flat move counts as a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardClose {
    horizon: usize,
}

impl ForwardClose {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon: horizon.max(1),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

impl OutcomeEvaluator for ForwardClose {
    fn evaluate(&self, signal: &Signal, series: &CandleSeries) -> Outcome {
        let kind = signal.kind();
        if !kind.is_bullish() && !kind.is_bearish() {
            return Outcome::Pending;
        }
        let Some(idx) = series.position(signal.timestamp()) else {
            return Outcome::Pending;
        };
        let Some(exit_idx) = idx.checked_add(self.horizon) else {
            return Outcome::Pending;
        };
        let bars = series.bars();
        let (Some(entry), Some(exit)) = (
            bars[idx].candle(),
            bars.get(exit_idx).and_then(|b| b.candle()),
        ) else {
            return Outcome::Pending;
        };

        let won = if kind.is_bullish() {
            exit.close > entry.close
        } else {
            exit.close < entry.close
        };
        if won {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use common::{Candle, SignalKind};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(i * 60, 0).unwrap()
    }

    fn series(closes: &[Decimal]) -> CandleSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &p)| Candle::new(p, p, p, p, ts(i as i64)))
            .collect();
        CandleSeries::from_candles(candles)
    }

    fn signal(kind: SignalKind, i: i64) -> Signal {
        Signal::new("EURUSD", kind, "test", ts(i), None)
    }

    #[test]
    fn call_wins_when_price_rises() {
        let s = series(&[dec!(1.0), dec!(1.1), dec!(1.2)]);
        let eval = ForwardClose::new(2);
        assert_eq!(eval.evaluate(&signal(SignalKind::Call, 0), &s), Outcome::Win);
        assert_eq!(eval.evaluate(&signal(SignalKind::Put, 0), &s), Outcome::Loss);
    }

    #[test]
    fn flat_move_is_a_loss() {
        let s = series(&[dec!(1.0), dec!(1.0)]);
        assert_eq!(
            ForwardClose::new(1).evaluate(&signal(SignalKind::PotentialPut, 0), &s),
            Outcome::Loss
        );
    }

    #[test]
    fn pending_without_future_bars_or_direction() {
        let s = series(&[dec!(1.0), dec!(1.1)]);
        let eval = ForwardClose::new(3);
        assert_eq!(eval.evaluate(&signal(SignalKind::Call, 0), &s), Outcome::Pending);
        assert_eq!(
            ForwardClose::new(1).evaluate(&signal(SignalKind::Trap, 0), &s),
            Outcome::Pending
        );
        // timestamp not in the series
        assert_eq!(
            ForwardClose::new(1).evaluate(&signal(SignalKind::Call, 99), &s),
            Outcome::Pending
        );
    }

    #[test]
    fn horizon_past_usize_range_is_pending() {
        let s = series(&[dec!(1.0), dec!(1.1), dec!(1.2)]);
        let eval = ForwardClose::new(usize::MAX);
        // signal on the last bar: idx + horizon cannot be represented
        assert_eq!(eval.evaluate(&signal(SignalKind::Call, 2), &s), Outcome::Pending);
        assert_eq!(eval.evaluate(&signal(SignalKind::Put, 0), &s), Outcome::Pending);
    }

    #[test]
    fn zero_horizon_is_clamped() {
        assert_eq!(ForwardClose::new(0).horizon(), 1);
    }
}

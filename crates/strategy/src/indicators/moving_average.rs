use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Moving-average flavour used for the fast/slow trend lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageKind {
    #[default]
    Sma,
    Ema,
}

impl AverageKind {
    pub fn compute(&self, values: &[Decimal], period: usize) -> Option<Decimal> {
        match self {
            AverageKind::Sma => sma(values, period),
            AverageKind::Ema => ema(values, period),
        }
    }
}

/// Simple average of the last `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().copied().sum::<Decimal>() / Decimal::from(period))
}

/// Exponential Moving Average of the last `period` values in `values`.
/// Seeded with the SMA of the oldest `period` values of the lookback.
pub fn ema(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let k = Decimal::TWO / (Decimal::from(period) + Decimal::ONE);
    let start = values.len().saturating_sub(period * 3); // enough history
    let slice = &values[start..];

    let mut ema_val = slice[..period].iter().copied().sum::<Decimal>() / Decimal::from(period);
    for &price in &slice[period..] {
        ema_val = price * k + ema_val * (Decimal::ONE - k);
    }
    Some(ema_val.round_dp(10))
}

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// One OHLC bar. Prices are exact decimals so grid and proximity
/// comparisons never drift at tier boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { open, high, low, close, timestamp }
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Provider-shaped candle. Every field may be missing; conversion into
/// [`Candle`] happens once, in [`CandleSeries::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub timestamp: Option<DateTime<Utc>>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

impl RawCandle {
    fn to_candle(&self, timestamp: DateTime<Utc>) -> Result<Candle> {
        let field = |name: &str, v: Option<f64>| -> Result<Decimal> {
            let v = v.ok_or_else(|| Error::InvalidPrice(format!("missing {name}")))?;
            price_from_f64(v)
        };
        Ok(Candle {
            open: field("open", self.open)?,
            high: field("high", self.high)?,
            low: field("low", self.low)?,
            close: field("close", self.close)?,
            timestamp,
        })
    }
}

/// Convert a provider float into an exact decimal using its shortest
/// round-trip representation (`1.1205` stays `1.1205`).
pub fn price_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::InvalidPrice(format!("non-finite value {value}")));
    }
    Decimal::from_str(&value.to_string())
        .map_err(|e| Error::InvalidPrice(format!("{value}: {e}")))
}

/// A slot in a normalized series. Malformed candles keep their position so
/// that windows touching them can be skipped without splicing neighbours
/// together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bar {
    Valid(Candle),
    Malformed { timestamp: DateTime<Utc> },
}

impl Bar {
    pub fn candle(&self) -> Option<&Candle> {
        match self {
            Bar::Valid(c) => Some(c),
            Bar::Malformed { .. } => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Bar::Valid(c) => c.timestamp,
            Bar::Malformed { timestamp } => *timestamp,
        }
    }
}

/// Candle history in canonical order: strictly increasing timestamps,
/// oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandleSeries {
    bars: Vec<Bar>,
}

impl CandleSeries {
    /// Build a series from provider records in any order.
    pub fn normalize(raw: Vec<RawCandle>) -> Self {
        let mut dropped = 0usize;
        let mut bars: Vec<Bar> = raw
            .into_iter()
            .filter_map(|r| {
                let Some(ts) = r.timestamp else {
                    dropped += 1;
                    return None;
                };
                Some(match r.to_candle(ts) {
                    Ok(candle) => Bar::Valid(candle),
                    Err(e) => {
                        debug!(timestamp = %ts, error = %e, "Malformed candle kept as gap");
                        Bar::Malformed { timestamp: ts }
                    }
                })
            })
            .collect();

        if dropped > 0 {
            warn!(dropped, "Dropped candles without timestamp");
        }

        bars.sort_by_key(Bar::timestamp);
        bars.dedup_by_key(|b| b.timestamp());
        Self { bars }
    }

    pub fn from_candles(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        Self {
            bars: candles.into_iter().map(Bar::Valid).collect(),
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn malformed_count(&self) -> usize {
        self.bars.iter().filter(|b| b.candle().is_none()).count()
    }

    /// The `size` candles ending at index `end` (inclusive), or `None` when
    /// the window is out of range or touches a malformed bar.
    pub fn window(&self, end: usize, size: usize) -> Option<Vec<Candle>> {
        if size == 0 || end >= self.bars.len() || end + 1 < size {
            return None;
        }
        self.bars[end + 1 - size..=end]
            .iter()
            .map(|b| b.candle().copied())
            .collect()
    }

    /// Valid candles up to and including index `end`.
    pub fn candles_until(&self, end: usize) -> Vec<Candle> {
        let stop = (end + 1).min(self.bars.len());
        self.bars[..stop].iter().filter_map(|b| b.candle().copied()).collect()
    }

    /// Index of the bar whose timestamp is `ts`.
    pub fn position(&self, ts: DateTime<Utc>) -> Option<usize> {
        self.bars.binary_search_by_key(&ts, Bar::timestamp).ok()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.bars.iter().rev().find_map(Bar::candle)
    }
}

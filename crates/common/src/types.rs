use std::num::NonZeroUsize;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Candle, Error};

/// Latest indicator readings for a series. Any indicator may be missing;
/// consumers treat absence as "condition not met", never as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub price: Decimal,
    pub rsi: Option<Decimal>,
    pub sma_fast: Option<Decimal>,
    pub sma_slow: Option<Decimal>,
}

impl IndicatorSnapshot {
    pub fn price_only(price: Decimal) -> Self {
        Self { price, rsi: None, sma_fast: None, sma_slow: None }
    }

    /// Fill the gaps in `self` with values from `fallback`.
    pub fn or(self, fallback: &IndicatorSnapshot) -> Self {
        Self {
            price: self.price,
            rsi: self.rsi.or(fallback.rsi),
            sma_fast: self.sma_fast.or(fallback.sma_fast),
            sma_slow: self.sma_slow.or(fallback.sma_slow),
        }
    }
}

/// Directional classification emitted by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Call,
    Put,
    PotentialCall,
    PotentialPut,
    Trap,
    Neutral,
}

impl SignalKind {
    /// Whether a scan should report this result.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, SignalKind::Neutral | SignalKind::Trap)
    }

    /// 0 = neutral/trap, 1 = potential, 2 = confirmed.
    pub fn tier(&self) -> u8 {
        match self {
            SignalKind::Call | SignalKind::Put => 2,
            SignalKind::PotentialCall | SignalKind::PotentialPut => 1,
            SignalKind::Trap | SignalKind::Neutral => 0,
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, SignalKind::Call | SignalKind::PotentialCall)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, SignalKind::Put | SignalKind::PotentialPut)
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Call => write!(f, "CALL"),
            SignalKind::Put => write!(f, "PUT"),
            SignalKind::PotentialCall => write!(f, "POTENTIAL_CALL"),
            SignalKind::PotentialPut => write!(f, "POTENTIAL_PUT"),
            SignalKind::Trap => write!(f, "TRAP"),
            SignalKind::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// A signal produced by evaluating a strategy on one window.
/// Fields are private so a signal cannot be altered once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    asset: String,
    kind: SignalKind,
    reason: String,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<Decimal>,
}

impl Signal {
    pub fn new(
        asset: impl Into<String>,
        kind: SignalKind,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
        confidence: Option<Decimal>,
    ) -> Self {
        Self {
            asset: asset.into(),
            kind,
            reason: reason.into(),
            timestamp,
            confidence,
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn confidence(&self) -> Option<Decimal> {
        self.confidence
    }
}

/// Trend direction as classified from moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
}

/// Which moving-average relationship defines the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPolicy {
    /// `UP` when the price is above the slow average.
    #[default]
    PriceVsSlowSma,
    /// `UP` when the fast average is above the slow one.
    FastSlowCross,
}

impl FromStr for TrendPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price_vs_slow_sma" => Ok(TrendPolicy::PriceVsSlowSma),
            "fast_slow_cross" => Ok(TrendPolicy::FastSlowCross),
            other => Err(Error::Config(format!("unknown trend policy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendFilter {
    #[default]
    Any,
    Up,
    Down,
}

impl TrendFilter {
    /// An unknown trend only passes the `ANY` filter.
    pub fn accepts(&self, trend: Option<Trend>) -> bool {
        match self {
            TrendFilter::Any => true,
            TrendFilter::Up => trend == Some(Trend::Up),
            TrendFilter::Down => trend == Some(Trend::Down),
        }
    }
}

impl FromStr for TrendFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ANY" | "" => Ok(TrendFilter::Any),
            "UP" => Ok(TrendFilter::Up),
            "DOWN" => Ok(TrendFilter::Down),
            other => Err(Error::InvalidRequest(format!(
                "trend_filter must be ANY, UP or DOWN, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalFilter {
    #[default]
    All,
    Call,
    Put,
}

impl SignalFilter {
    /// `CALL` admits confirmed and potential calls; `PUT` mirrors it.
    pub fn accepts(&self, kind: SignalKind) -> bool {
        match self {
            SignalFilter::All => true,
            SignalFilter::Call => kind.is_bullish(),
            SignalFilter::Put => kind.is_bearish(),
        }
    }
}

impl FromStr for SignalFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" | "" => Ok(SignalFilter::All),
            "CALL" => Ok(SignalFilter::Call),
            "PUT" => Ok(SignalFilter::Put),
            other => Err(Error::InvalidRequest(format!(
                "signal_filter must be ALL, CALL or PUT, got '{other}'"
            ))),
        }
    }
}

/// Which end of the series a scan starts from. The cap applies after
/// ordering, so newest-first returns the most recent signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Per-request scan parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Opaque to the core; passed through to the data source.
    pub timeframe: String,
    pub trend_filter: TrendFilter,
    pub signal_filter: SignalFilter,
    pub max_signals: NonZeroUsize,
    /// Overrides the strategy's own policy for both the trend filter and
    /// trend scoring. `None` keeps the strategy's.
    #[serde(default)]
    pub trend_policy: Option<TrendPolicy>,
    #[serde(default)]
    pub order: ScanOrder,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            timeframe: "1min".to_string(),
            trend_filter: TrendFilter::Any,
            signal_filter: SignalFilter::All,
            max_signals: NonZeroUsize::MIN,
            trend_policy: None,
            order: ScanOrder::default(),
        }
    }
}

/// One tick relayed from the live upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    pub asset: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candle: Option<Candle>,
}

/// Strip separators and the OTC suffix from a user-facing symbol:
/// `EUR/USD`, `eur-usd` and `EURUSD-OTC` all become `EURUSD`.
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    let base = upper
        .strip_suffix("-OTC")
        .or_else(|| upper.strip_suffix("_OTC"))
        .unwrap_or(&upper);
    base.chars().filter(|c| !matches!(c, '/' | '-' | '_' | ' ')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn actionable_excludes_neutral_and_trap() {
        assert!(SignalKind::Call.is_actionable());
        assert!(SignalKind::PotentialPut.is_actionable());
        assert!(!SignalKind::Trap.is_actionable());
        assert!(!SignalKind::Neutral.is_actionable());
    }

    #[test]
    fn signal_filter_matches_direction() {
        assert!(SignalFilter::Call.accepts(SignalKind::PotentialCall));
        assert!(!SignalFilter::Call.accepts(SignalKind::Put));
        assert!(SignalFilter::Put.accepts(SignalKind::Put));
        assert!(SignalFilter::All.accepts(SignalKind::PotentialPut));
    }

    #[test]
    fn trend_filter_rejects_unknown_trend_unless_any() {
        assert!(TrendFilter::Any.accepts(None));
        assert!(!TrendFilter::Up.accepts(None));
        assert!(TrendFilter::Down.accepts(Some(Trend::Down)));
    }

    #[test]
    fn filters_parse_case_insensitively() {
        assert_eq!("call".parse::<SignalFilter>().unwrap(), SignalFilter::Call);
        assert_eq!("Down".parse::<TrendFilter>().unwrap(), TrendFilter::Down);
        let err = "SIDEWAYS".parse::<TrendFilter>().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn snapshot_gaps_filled_from_fallback() {
        let provided = IndicatorSnapshot {
            price: dec!(1.5),
            rsi: Some(dec!(42)),
            sma_fast: None,
            sma_slow: None,
        };
        let derived = IndicatorSnapshot {
            price: dec!(1.4),
            rsi: Some(dec!(60)),
            sma_fast: Some(dec!(1.3)),
            sma_slow: None,
        };
        let merged = provided.or(&derived);
        assert_eq!(merged.price, dec!(1.5));
        assert_eq!(merged.rsi, Some(dec!(42)));
        assert_eq!(merged.sma_fast, Some(dec!(1.3)));
        assert_eq!(merged.sma_slow, None);
    }

    #[test]
    fn symbols_normalize_like_provider_expects() {
        assert_eq!(normalize_symbol("EUR/USD"), "EURUSD");
        assert_eq!(normalize_symbol("eur-usd-otc"), "EURUSD");
        assert_eq!(normalize_symbol("USDJPY_OTC"), "USDJPY");
        assert_eq!(normalize_symbol(" AAPL "), "AAPL");
    }

    #[test]
    fn signal_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&SignalKind::PotentialCall).unwrap();
        assert_eq!(json, "\"POTENTIAL_CALL\"");
    }
}

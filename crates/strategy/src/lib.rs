pub mod breakout;
pub mod config;
pub mod confluence;
pub mod engulfing;
pub mod indicators;
pub mod levels;
pub mod outcome;
pub mod pattern;
pub mod registry;
pub mod rsi_sma;
pub mod scanner;
pub mod service;
pub mod trend;

pub use breakout::{BreakoutAnchor, BreakoutStrategy};
pub use config::{StrategyDefinition, StrategyFileConfig};
pub use confluence::{ConfluenceStrategy, ConfluenceThresholds};
pub use engulfing::EngulfingStrategy;
pub use indicators::IndicatorSettings;
pub use levels::{Level, LevelReading, RoundNumberPair};
pub use outcome::{ForwardClose, Outcome, OutcomeEvaluator};
pub use registry::StrategyRegistry;
pub use rsi_sma::{RsiSmaStrategy, RsiSmaThresholds};
pub use scanner::{ScanReport, SignalScanner};
pub use service::{SignalRequest, SignalResponse, SignalService};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use common::{Candle, IndicatorSnapshot, Signal, SignalKind, TrendPolicy};

/// All strategy implementations must satisfy this trait.
///
/// Evaluation is a pure function of the window and its context, so one
/// instance can be shared by any number of concurrent scans.
pub trait Strategy: Send + Sync {
    /// Human-readable name of this strategy instance.
    fn name(&self) -> &str;

    /// Number of candles one evaluation consumes.
    fn window(&self) -> usize;

    /// Trailing window for support/resistance, if the strategy uses levels.
    fn level_window(&self) -> Option<usize> {
        None
    }

    /// Trend policy the strategy scores with, if it looks at trend at all.
    fn trend_policy(&self) -> Option<TrendPolicy> {
        None
    }

    /// Evaluate one window of candles, oldest first.
    fn evaluate(&self, window: &[Candle], ctx: &EvalContext) -> Evaluation;
}

/// Market context as of the last candle of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    pub snapshot: IndicatorSnapshot,
    pub level: Option<LevelReading>,
    /// Policy the scan classifies trend with. Strategies that score trend
    /// must use it when set, so scoring agrees with the trend filter.
    pub trend_policy: Option<TrendPolicy>,
}

impl EvalContext {
    pub fn new(snapshot: IndicatorSnapshot) -> Self {
        Self {
            snapshot,
            level: None,
            trend_policy: None,
        }
    }

    pub fn with_level(mut self, level: Option<LevelReading>) -> Self {
        self.level = level;
        self
    }

    pub fn with_trend_policy(mut self, policy: TrendPolicy) -> Self {
        self.trend_policy = Some(policy);
        self
    }
}

/// Result of evaluating one window, before it is stamped into a [`Signal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub kind: SignalKind,
    pub reason: String,
    pub confidence: Option<Decimal>,
}

impl Evaluation {
    pub fn new(kind: SignalKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            confidence: None,
        }
    }

    pub fn neutral(reason: impl Into<String>) -> Self {
        Self::new(SignalKind::Neutral, reason)
    }

    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn into_signal(self, asset: &str, timestamp: DateTime<Utc>) -> Signal {
        Signal::new(asset, self.kind, self.reason, timestamp, self.confidence)
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use common::{Candle, SignalKind, Trend, TrendPolicy};

use crate::levels::{LevelReading, DEFAULT_LEVEL_WINDOW};
use crate::pattern::{detect_engulfing, Engulfing};
use crate::trend;
use crate::{EvalContext, Evaluation, Strategy};

/// Score at which a side is confirmed.
pub const CONFIRMED_SCORE: usize = 3;
/// Score at which a side is reported as forming.
pub const POTENTIAL_SCORE: usize = 2;

/// Thresholds for the RSI and proximity conditions.
///
/// Two historical threshold sets exist; both are available as presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfluenceThresholds {
    /// CALL condition: `rsi < rsi_call_below`.
    pub rsi_call_below: Decimal,
    /// PUT condition: `rsi > rsi_put_above`.
    pub rsi_put_above: Decimal,
    /// Fraction of price within which a level counts as "near".
    pub proximity: Decimal,
}

impl ConfluenceThresholds {
    /// RSI 45/55, proximity 0.2%.
    pub fn standard() -> Self {
        Self {
            rsi_call_below: dec!(45),
            rsi_put_above: dec!(55),
            proximity: dec!(0.002),
        }
    }

    /// RSI 40/60, proximity 0.1%.
    pub fn strict() -> Self {
        Self {
            rsi_call_below: dec!(40),
            rsi_put_above: dec!(60),
            proximity: dec!(0.001),
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "standard" => Some(Self::standard()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }
}

impl Default for ConfluenceThresholds {
    fn default() -> Self {
        Self::standard()
    }
}

/// Names of the satisfied conditions per side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfluenceScore {
    pub call: Vec<&'static str>,
    pub put: Vec<&'static str>,
    /// Inputs that were missing and therefore counted as unmet.
    pub unavailable: Vec<&'static str>,
}

impl ConfluenceScore {
    pub fn decision(&self) -> SignalKind {
        decide(self.call.len(), self.put.len())
    }
}

/// Map per-side scores to a decision. CALL is checked first at each tier.
pub fn decide(call: usize, put: usize) -> SignalKind {
    if call >= CONFIRMED_SCORE {
        SignalKind::Call
    } else if put >= CONFIRMED_SCORE {
        SignalKind::Put
    } else if call == POTENTIAL_SCORE {
        SignalKind::PotentialCall
    } else if put == POTENTIAL_SCORE {
        SignalKind::PotentialPut
    } else {
        SignalKind::Neutral
    }
}

/// Weighted multi-condition scorer over `(prev, curr)` plus indicators and
/// support/resistance.
#[derive(Debug, Clone)]
pub struct ConfluenceStrategy {
    name: String,
    thresholds: ConfluenceThresholds,
    trend_policy: TrendPolicy,
    level_window: usize,
}

impl ConfluenceStrategy {
    pub const WINDOW: usize = 2;

    pub fn new(name: impl Into<String>, thresholds: ConfluenceThresholds) -> Self {
        Self {
            name: name.into(),
            thresholds,
            trend_policy: TrendPolicy::default(),
            level_window: DEFAULT_LEVEL_WINDOW,
        }
    }

    pub fn with_trend_policy(mut self, policy: TrendPolicy) -> Self {
        self.trend_policy = policy;
        self
    }

    pub fn with_level_window(mut self, window: usize) -> Self {
        self.level_window = window.max(1);
        self
    }

    /// Score `(prev, curr)` against `ctx`. Trend uses the context's policy
    /// when the scan set one, the strategy's own otherwise.
    pub fn score(&self, prev: &Candle, curr: &Candle, ctx: &EvalContext) -> ConfluenceScore {
        let mut score = ConfluenceScore::default();
        let t = &self.thresholds;
        let snapshot = &ctx.snapshot;
        let price = snapshot.price;
        let policy = ctx.trend_policy.unwrap_or(self.trend_policy);

        match trend::classify(policy, snapshot) {
            Ok(Trend::Up) => score.call.push("uptrend"),
            Ok(Trend::Down) => score.put.push("downtrend"),
            Err(_) => score.unavailable.push("trend"),
        }

        match snapshot.rsi {
            Some(rsi) if rsi < t.rsi_call_below => score.call.push("rsi_oversold"),
            Some(rsi) if rsi > t.rsi_put_above => score.put.push("rsi_overbought"),
            Some(_) => {}
            None => score.unavailable.push("rsi"),
        }

        match ctx.level.as_ref().map(|r| &r.level) {
            Some(level) => {
                let band = price * t.proximity;
                if (price - level.support).abs() < band {
                    score.call.push("near_support");
                }
                if (price - level.resistance).abs() < band {
                    score.put.push("near_resistance");
                }
            }
            None => score.unavailable.push("level"),
        }

        match detect_engulfing(prev, curr) {
            Engulfing::Bullish => score.call.push("bullish_engulfing"),
            Engulfing::Bearish => score.put.push("bearish_engulfing"),
            Engulfing::Neither => {}
        }

        score
    }

    fn explain(score: &ConfluenceScore, kind: SignalKind, level: Option<&LevelReading>) -> String {
        let leans_put = kind == SignalKind::Neutral && score.put.len() > score.call.len();
        let (side, met) = if kind.is_bearish() || leans_put {
            ("PUT", &score.put)
        } else {
            ("CALL", &score.call)
        };
        let mut reason = if met.is_empty() {
            "no conditions met".to_string()
        } else {
            format!("{side} conditions met ({}/4): {}", met.len(), met.join(", "))
        };
        if !score.unavailable.is_empty() {
            reason.push_str(&format!("; unavailable: {}", score.unavailable.join(", ")));
        }
        if let Some(r) = level.filter(|r| r.degraded) {
            reason.push_str(&format!("; level from {} candles only", r.candles));
        }
        reason
    }
}

impl Strategy for ConfluenceStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        Self::WINDOW
    }

    fn level_window(&self) -> Option<usize> {
        Some(self.level_window)
    }

    fn trend_policy(&self) -> Option<TrendPolicy> {
        Some(self.trend_policy)
    }

    fn evaluate(&self, window: &[Candle], ctx: &EvalContext) -> Evaluation {
        let [prev, curr] = match window {
            [.., prev, curr] => [prev, curr],
            _ => {
                return Evaluation::neutral(format!(
                    "insufficient window: need {} candles, got {}",
                    Self::WINDOW,
                    window.len()
                ))
            }
        };

        let score = self.score(prev, curr, ctx);
        let kind = score.decision();
        let eval = Evaluation::new(kind, Self::explain(&score, kind, ctx.level.as_ref()));
        match kind {
            SignalKind::Call | SignalKind::PotentialCall => {
                eval.with_confidence(Decimal::from(score.call.len()))
            }
            SignalKind::Put | SignalKind::PotentialPut => {
                eval.with_confidence(Decimal::from(score.put.len()))
            }
            _ => eval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::Level;
    use chrono::{TimeZone, Utc};
    use common::IndicatorSnapshot;

    fn c(i: i64, open: Decimal, close: Decimal) -> Candle {
        let (low, high) = (open.min(close), open.max(close));
        Candle::new(open, high, low, close, Utc.timestamp_opt(i * 60, 0).unwrap())
    }

    fn bullish_pair() -> [Candle; 2] {
        [c(0, dec!(1.1010), dec!(1.1000)), c(1, dec!(1.0998), dec!(1.1012))]
    }

    fn snapshot(rsi: Decimal, sma_slow: Decimal) -> IndicatorSnapshot {
        IndicatorSnapshot {
            price: dec!(1.1012),
            rsi: Some(rsi),
            sma_fast: None,
            sma_slow: Some(sma_slow),
        }
    }

    fn ctx(snapshot: IndicatorSnapshot, support: Decimal, resistance: Decimal) -> EvalContext {
        EvalContext::new(snapshot).with_level(Some(LevelReading {
            level: Level { support, resistance },
            candles: 50,
            degraded: false,
        }))
    }

    #[test]
    fn all_four_call_conditions_is_call_with_score_4() {
        // price 1.1012, support 1.1005: 0.06% away, inside 0.2%
        let strategy = ConfluenceStrategy::new("confluence", ConfluenceThresholds::standard());
        let ctx = ctx(snapshot(dec!(30), dec!(1.0900)), dec!(1.1005), dec!(1.1300));
        let eval = strategy.evaluate(&bullish_pair(), &ctx);
        assert_eq!(eval.kind, SignalKind::Call);
        assert_eq!(eval.confidence, Some(dec!(4)));
        for name in ["uptrend", "rsi_oversold", "near_support", "bullish_engulfing"] {
            assert!(eval.reason.contains(name), "reason missing {name}: {}", eval.reason);
        }
    }

    #[test]
    fn two_conditions_is_potential() {
        let strategy = ConfluenceStrategy::new("confluence", ConfluenceThresholds::standard());
        // uptrend + engulfing only: rsi neutral, support far away
        let ctx = ctx(snapshot(dec!(50), dec!(1.0900)), dec!(1.0500), dec!(1.1300));
        let eval = strategy.evaluate(&bullish_pair(), &ctx);
        assert_eq!(eval.kind, SignalKind::PotentialCall);
        assert_eq!(eval.confidence, Some(dec!(2)));
    }

    #[test]
    fn put_side_mirrors() {
        let strategy = ConfluenceStrategy::new("confluence", ConfluenceThresholds::standard());
        let pair = [c(0, dec!(1.1000), dec!(1.1010)), c(1, dec!(1.1012), dec!(1.0995))];
        let mut snap = snapshot(dec!(70), dec!(1.1100));
        snap.price = dec!(1.0995);
        let ctx = ctx(snap, dec!(1.0500), dec!(1.1000));
        let eval = strategy.evaluate(&pair, &ctx);
        assert_eq!(eval.kind, SignalKind::Put);
        assert_eq!(eval.confidence, Some(dec!(4)));
        assert!(eval.reason.starts_with("PUT conditions met (4/4)"));
    }

    #[test]
    fn rsi_between_presets_depends_on_preset() {
        // rsi 42: oversold under standard (45), not under strict (40)
        let snap = snapshot(dec!(42), dec!(1.0900));
        let ctx = ctx(snap, dec!(1.0500), dec!(1.1300));
        let standard = ConfluenceStrategy::new("s", ConfluenceThresholds::standard());
        let strict = ConfluenceStrategy::new("x", ConfluenceThresholds::strict());
        assert_eq!(standard.evaluate(&bullish_pair(), &ctx).kind, SignalKind::Call);
        assert_eq!(strict.evaluate(&bullish_pair(), &ctx).kind, SignalKind::PotentialCall);
    }

    #[test]
    fn proximity_between_presets_depends_on_preset() {
        // support 0.15% below price: near for 0.2%, not for 0.1%
        let price = dec!(1.1012);
        let support = price - price * dec!(0.0015);
        let ctx = ctx(snapshot(dec!(50), dec!(1.2000)), support, dec!(1.3000));
        let pair = [c(0, dec!(1.1000), dec!(1.1005)), c(1, dec!(1.1005), dec!(1.1012))];
        let standard = ConfluenceStrategy::new("s", ConfluenceThresholds::standard());
        let strict = ConfluenceStrategy::new("x", ConfluenceThresholds::strict());
        let std_score = standard.score(&pair[0], &pair[1], &ctx);
        let strict_score = strict.score(&pair[0], &pair[1], &ctx);
        assert!(std_score.call.contains(&"near_support"));
        assert!(!strict_score.call.contains(&"near_support"));
    }

    #[test]
    fn missing_indicators_degrade_not_crash() {
        let strategy = ConfluenceStrategy::new("confluence", ConfluenceThresholds::standard());
        let ctx = EvalContext::new(IndicatorSnapshot::price_only(dec!(1.1012)));
        let eval = strategy.evaluate(&bullish_pair(), &ctx);
        assert_eq!(eval.kind, SignalKind::Neutral);
        assert!(eval.reason.contains("unavailable: trend, rsi, level"));
    }

    #[test]
    fn degraded_level_is_flagged() {
        let strategy = ConfluenceStrategy::new("confluence", ConfluenceThresholds::standard());
        let mut ctx = ctx(snapshot(dec!(30), dec!(1.0900)), dec!(1.1005), dec!(1.1300));
        ctx.level = ctx.level.map(|r| LevelReading { candles: 12, degraded: true, ..r });
        let eval = strategy.evaluate(&bullish_pair(), &ctx);
        assert_eq!(eval.kind, SignalKind::Call);
        assert!(eval.reason.contains("level from 12 candles only"));
    }

    #[test]
    fn context_policy_overrides_own_policy() {
        // price under the slow average, fast average above it
        let snap = IndicatorSnapshot {
            price: dec!(1.0),
            rsi: Some(dec!(50)),
            sma_fast: Some(dec!(1.2)),
            sma_slow: Some(dec!(1.1)),
        };
        let pair = bullish_pair();
        let strategy = ConfluenceStrategy::new("confluence", ConfluenceThresholds::standard());
        assert_eq!(strategy.trend_policy(), Some(TrendPolicy::PriceVsSlowSma));

        let own = strategy.score(&pair[0], &pair[1], &EvalContext::new(snap.clone()));
        assert!(own.put.contains(&"downtrend"));

        let ctx = EvalContext::new(snap).with_trend_policy(TrendPolicy::FastSlowCross);
        let overridden = strategy.score(&pair[0], &pair[1], &ctx);
        assert!(overridden.call.contains(&"uptrend"));
        assert!(!overridden.put.contains(&"downtrend"));
    }

    #[test]
    fn ties_resolve_call_first() {
        assert_eq!(decide(3, 3), SignalKind::Call);
        assert_eq!(decide(2, 2), SignalKind::PotentialCall);
        assert_eq!(decide(2, 3), SignalKind::Put);
        assert_eq!(decide(1, 2), SignalKind::PotentialPut);
        assert_eq!(decide(1, 1), SignalKind::Neutral);
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(ConfluenceThresholds::preset("STRICT"), Some(ConfluenceThresholds::strict()));
        assert_eq!(ConfluenceThresholds::preset("standard"), Some(ConfluenceThresholds::default()));
        assert!(ConfluenceThresholds::preset("loose").is_none());
    }
}

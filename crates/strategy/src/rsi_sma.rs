use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use common::{Candle, SignalKind};

use crate::{EvalContext, Evaluation, Strategy};

/// RSI bands for the indicator-only strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiSmaThresholds {
    /// Above this with price under the average: strong PUT.
    pub strong_overbought: Decimal,
    /// Below this with price over the average: strong CALL.
    pub strong_oversold: Decimal,
    pub overbought: Decimal,
    pub oversold: Decimal,
    pub strong_confidence: Decimal,
    pub weak_confidence: Decimal,
}

impl Default for RsiSmaThresholds {
    fn default() -> Self {
        Self {
            strong_overbought: dec!(70),
            strong_oversold: dec!(30),
            overbought: dec!(65),
            oversold: dec!(35),
            strong_confidence: dec!(0.8),
            weak_confidence: dec!(0.6),
        }
    }
}

/// Latest-bar signal from RSI extremes, strengthened when price sits on the
/// opposite side of the fast average.
#[derive(Debug, Clone)]
pub struct RsiSmaStrategy {
    name: String,
    thresholds: RsiSmaThresholds,
}

impl RsiSmaStrategy {
    pub fn new(name: impl Into<String>, thresholds: RsiSmaThresholds) -> Self {
        Self {
            name: name.into(),
            thresholds,
        }
    }
}

impl Strategy for RsiSmaStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        1
    }

    fn evaluate(&self, _window: &[Candle], ctx: &EvalContext) -> Evaluation {
        let t = &self.thresholds;
        let snap = &ctx.snapshot;
        let (Some(rsi), Some(sma)) = (snap.rsi, snap.sma_fast) else {
            return Evaluation::neutral("rsi or sma unavailable");
        };
        let price = snap.price;

        if rsi > t.strong_overbought && price < sma {
            Evaluation::new(SignalKind::Put, format!("rsi {rsi} overbought, price below sma {sma}"))
                .with_confidence(t.strong_confidence)
        } else if rsi < t.strong_oversold && price > sma {
            Evaluation::new(SignalKind::Call, format!("rsi {rsi} oversold, price above sma {sma}"))
                .with_confidence(t.strong_confidence)
        } else if rsi > t.overbought {
            Evaluation::new(SignalKind::Put, format!("rsi {rsi} above {}", t.overbought))
                .with_confidence(t.weak_confidence)
        } else if rsi < t.oversold {
            Evaluation::new(SignalKind::Call, format!("rsi {rsi} below {}", t.oversold))
                .with_confidence(t.weak_confidence)
        } else {
            Evaluation::neutral(format!("rsi {rsi} within bands"))
        }
    }
}

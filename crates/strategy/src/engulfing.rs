use common::{Candle, SignalKind};

use crate::pattern::{detect_engulfing, Engulfing};
use crate::{EvalContext, Evaluation, Strategy};

/// Signals on the engulfing pattern alone.
#[derive(Debug, Clone)]
pub struct EngulfingStrategy {
    name: String,
}

impl EngulfingStrategy {
    pub const WINDOW: usize = 2;

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Strategy for EngulfingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        Self::WINDOW
    }

    fn evaluate(&self, window: &[Candle], _ctx: &EvalContext) -> Evaluation {
        let [.., prev, curr] = window else {
            return Evaluation::neutral("insufficient window: need 2 candles");
        };
        match detect_engulfing(prev, curr) {
            Engulfing::Bullish => Evaluation::new(SignalKind::Call, "bullish engulfing"),
            Engulfing::Bearish => Evaluation::new(SignalKind::Put, "bearish engulfing"),
            Engulfing::Neither => Evaluation::neutral("no engulfing pattern"),
        }
    }
}

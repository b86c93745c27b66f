use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use common::{Candle, Error, SignalKind};

use crate::levels::RoundNumberPair;
use crate::{EvalContext, Evaluation, Strategy};

/// Which price of the breakout candle the round-number grid is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutAnchor {
    /// Grid brackets the breakout candle's close. The close never lies
    /// outside its own bracket, so no candidate forms and every window is
    /// NEUTRAL.
    #[default]
    BreakoutClose,
    /// Opt-in variant: grid brackets the breakout candle's open, so a close
    /// beyond either line is a crossing made within that candle.
    BreakoutOpen,
}

impl FromStr for BreakoutAnchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakout_open" | "open" => Ok(BreakoutAnchor::BreakoutOpen),
            "breakout_close" | "close" => Ok(BreakoutAnchor::BreakoutClose),
            other => Err(Error::Config(format!("unknown breakout anchor '{other}'"))),
        }
    }
}

/// Direction of a breakout candle relative to the grid. Computed per
/// window, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Bullish,
    Bearish,
}

/// Round-number breakout with confirmation and trap detection over
/// `(prior, breakout, confirm)`.
#[derive(Debug, Clone)]
pub struct BreakoutStrategy {
    name: String,
    anchor: BreakoutAnchor,
}

impl BreakoutStrategy {
    pub const WINDOW: usize = 3;

    pub fn new(name: impl Into<String>, anchor: BreakoutAnchor) -> Self {
        Self {
            name: name.into(),
            anchor,
        }
    }

    /// Evaluate the last three candles of `window`.
    pub fn evaluate_window(&self, window: &[Candle]) -> Evaluation {
        if window.len() < Self::WINDOW {
            return Evaluation::neutral(format!(
                "insufficient window: need {} candles, got {}",
                Self::WINDOW,
                window.len()
            ));
        }
        let [_prior, breakout, confirm] = [
            &window[window.len() - 3],
            &window[window.len() - 2],
            &window[window.len() - 1],
        ];

        let anchor = match self.anchor {
            BreakoutAnchor::BreakoutOpen => breakout.open,
            BreakoutAnchor::BreakoutClose => breakout.close,
        };
        let pair = match RoundNumberPair::locate(anchor) {
            Ok(pair) => pair,
            Err(e) => return Evaluation::neutral(e.to_string()),
        };

        match candidate(&pair, breakout) {
            Some(Candidate::Bullish) => confirm_bullish(pair.upper, confirm),
            Some(Candidate::Bearish) => confirm_bearish(pair.lower, confirm),
            None => Evaluation::neutral(format!(
                "no breakout of {} / {}",
                pair.lower, pair.upper
            )),
        }
    }
}

fn candidate(pair: &RoundNumberPair, breakout: &Candle) -> Option<Candidate> {
    if breakout.open < pair.upper && breakout.close > pair.upper {
        Some(Candidate::Bullish)
    } else if breakout.open > pair.lower && breakout.close < pair.lower {
        Some(Candidate::Bearish)
    } else {
        None
    }
}

fn confirm_bullish(level: Decimal, confirm: &Candle) -> Evaluation {
    if confirm.close < level {
        Evaluation::new(
            SignalKind::Trap,
            format!("price failed to hold above the broken level {level}"),
        )
    } else if confirm.is_bullish() {
        Evaluation::new(
            SignalKind::Call,
            format!("breakout above {level} confirmed by a bullish candle"),
        )
    } else {
        Evaluation::neutral(format!("broke above {level} without bullish confirmation"))
    }
}

fn confirm_bearish(level: Decimal, confirm: &Candle) -> Evaluation {
    if confirm.close > level {
        Evaluation::new(
            SignalKind::Trap,
            format!("price failed to hold below the broken level {level}"),
        )
    } else if confirm.is_bearish() {
        Evaluation::new(
            SignalKind::Put,
            format!("breakdown below {level} confirmed by a bearish candle"),
        )
    } else {
        Evaluation::neutral(format!("broke below {level} without bearish confirmation"))
    }
}

impl Strategy for BreakoutStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn window(&self) -> usize {
        Self::WINDOW
    }

    fn evaluate(&self, window: &[Candle], _ctx: &EvalContext) -> Evaluation {
        self.evaluate_window(window)
    }
}

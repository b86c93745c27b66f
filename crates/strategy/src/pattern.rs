use serde::Serialize;

use common::Candle;

/// Two-candle engulfing classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Engulfing {
    Bullish,
    Bearish,
    Neither,
}

/// Classify the adjacent pair `(prev, curr)`, oldest first.
pub fn detect_engulfing(prev: &Candle, curr: &Candle) -> Engulfing {
    if curr.open < prev.close && curr.close > prev.open {
        Engulfing::Bullish
    } else if curr.open > prev.close && curr.close < prev.open {
        Engulfing::Bearish
    } else {
        Engulfing::Neither
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candle(open: Decimal, close: Decimal) -> Candle {
        let (low, high) = (open.min(close), open.max(close));
        Candle::new(open, high, low, close, Utc.timestamp_opt(0, 0).unwrap())
    }

    #[test]
    fn bullish_engulfing() {
        let prev = candle(dec!(1.105), dec!(1.100));
        let curr = candle(dec!(1.099), dec!(1.108));
        assert_eq!(detect_engulfing(&prev, &curr), Engulfing::Bullish);
    }

    #[test]
    fn bearish_engulfing() {
        let prev = candle(dec!(1.100), dec!(1.105));
        let curr = candle(dec!(1.106), dec!(1.098));
        assert_eq!(detect_engulfing(&prev, &curr), Engulfing::Bearish);
    }

    #[test]
    fn inside_bar_is_neither() {
        let prev = candle(dec!(1.100), dec!(1.110));
        let curr = candle(dec!(1.102), dec!(1.108));
        assert_eq!(detect_engulfing(&prev, &curr), Engulfing::Neither);
    }

    #[test]
    fn touching_bodies_do_not_count() {
        // strict comparisons: equal open/close is not an engulf
        let prev = candle(dec!(1.105), dec!(1.100));
        let curr = candle(dec!(1.100), dec!(1.108));
        assert_eq!(detect_engulfing(&prev, &curr), Engulfing::Neither);
    }
}

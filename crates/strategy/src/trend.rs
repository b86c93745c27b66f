use common::{Error, IndicatorSnapshot, Result, Trend, TrendPolicy};

/// Classify the trend under `policy`. A missing average is reported as
/// `IndicatorUnavailable`; callers treat it as "no trend", not a failure.
pub fn classify(policy: TrendPolicy, snapshot: &IndicatorSnapshot) -> Result<Trend> {
    let slow = snapshot
        .sma_slow
        .ok_or(Error::IndicatorUnavailable("sma_slow"))?;
    let reference = match policy {
        TrendPolicy::PriceVsSlowSma => snapshot.price,
        TrendPolicy::FastSlowCross => snapshot
            .sma_fast
            .ok_or(Error::IndicatorUnavailable("sma_fast"))?,
    };
    Ok(if reference > slow { Trend::Up } else { Trend::Down })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            price: dec!(1.20),
            rsi: None,
            sma_fast: Some(dec!(1.10)),
            sma_slow: Some(dec!(1.15)),
        }
    }

    #[test]
    fn policies_can_disagree() {
        let snap = snapshot();
        assert_eq!(classify(TrendPolicy::PriceVsSlowSma, &snap).unwrap(), Trend::Up);
        assert_eq!(classify(TrendPolicy::FastSlowCross, &snap).unwrap(), Trend::Down);
    }

    #[test]
    fn equal_values_classify_down() {
        let mut snap = snapshot();
        snap.price = dec!(1.15);
        assert_eq!(classify(TrendPolicy::PriceVsSlowSma, &snap).unwrap(), Trend::Down);
    }

    #[test]
    fn missing_average_is_unavailable() {
        let mut snap = snapshot();
        snap.sma_fast = None;
        assert!(classify(TrendPolicy::PriceVsSlowSma, &snap).is_ok());
        assert!(matches!(
            classify(TrendPolicy::FastSlowCross, &snap),
            Err(Error::IndicatorUnavailable("sma_fast"))
        ));

        snap.sma_slow = None;
        assert!(matches!(
            classify(TrendPolicy::PriceVsSlowSma, &snap),
            Err(Error::IndicatorUnavailable("sma_slow"))
        ));
    }
}

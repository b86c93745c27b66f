use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use common::{normalize_symbol, PriceTick};

/// Most recent relayed tick per asset, keyed by normalized symbol.
#[derive(Clone, Default)]
pub struct LatestCandles {
    inner: Arc<RwLock<HashMap<String, PriceTick>>>,
}

impl LatestCandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `tick` unless a newer one for the same asset is already stored.
    pub async fn record(&self, tick: &PriceTick) {
        let key = normalize_symbol(&tick.asset);
        let mut inner = self.inner.write().await;
        match inner.get(&key) {
            Some(existing) if existing.timestamp > tick.timestamp => {}
            _ => {
                inner.insert(key, tick.clone());
            }
        }
    }

    pub async fn get(&self, asset: &str) -> Option<PriceTick> {
        self.inner.read().await.get(&normalize_symbol(asset)).cloned()
    }

    pub async fn assets(&self) -> Vec<String> {
        let mut assets: Vec<_> = self.inner.read().await.keys().cloned().collect();
        assets.sort();
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tick(asset: &str, secs: i64, price: Decimal) -> PriceTick {
        PriceTick {
            asset: asset.into(),
            price,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            candle: None,
        }
    }

    #[tokio::test]
    async fn lookup_normalizes_symbol() {
        let cache = LatestCandles::new();
        cache.record(&tick("EURUSD", 60, dec!(1.1))).await;
        assert_eq!(cache.get("eur/usd-otc").await.unwrap().price, dec!(1.1));
        assert!(cache.get("GBPUSD").await.is_none());
    }

    #[tokio::test]
    async fn stale_tick_does_not_replace_newer_one() {
        let cache = LatestCandles::new();
        cache.record(&tick("EURUSD", 120, dec!(1.2))).await;
        cache.record(&tick("EURUSD", 60, dec!(1.1))).await;
        assert_eq!(cache.get("EURUSD").await.unwrap().price, dec!(1.2));
        cache.record(&tick("EURUSD", 180, dec!(1.3))).await;
        assert_eq!(cache.get("EURUSD").await.unwrap().price, dec!(1.3));
        assert_eq!(cache.assets().await, vec!["EURUSD".to_string()]);
    }
}

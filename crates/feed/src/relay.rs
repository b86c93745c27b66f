use tokio::sync::mpsc;
use tracing::{debug, info};

use common::PriceTick;

use crate::{Broadcaster, LatestCandles};

/// Consumes upstream ticks, records them and fans them out.
pub struct Relay {
    tick_rx: mpsc::Receiver<PriceTick>,
    broadcaster: Broadcaster,
    latest: LatestCandles,
}

impl Relay {
    pub fn new(
        tick_rx: mpsc::Receiver<PriceTick>,
        broadcaster: Broadcaster,
        latest: LatestCandles,
    ) -> Self {
        Self {
            tick_rx,
            broadcaster,
            latest,
        }
    }

    /// Run until every tick sender is dropped.
    pub async fn run(mut self) {
        info!("Feed relay running");
        while let Some(tick) = self.tick_rx.recv().await {
            self.latest.record(&tick).await;
            let delivered = self.broadcaster.broadcast(&tick).await;
            debug!(asset = %tick.asset, price = %tick.price, delivered, "Tick relayed");
        }
        info!("Tick channel closed, feed relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn relays_to_subscribers_and_cache() {
        let (tx, rx) = mpsc::channel(8);
        let broadcaster = Broadcaster::new();
        let latest = LatestCandles::new();
        let (_id, mut sub) = broadcaster.subscribe().await;
        let handle = tokio::spawn(Relay::new(rx, broadcaster.clone(), latest.clone()).run());

        let tick = PriceTick {
            asset: "EURUSD".into(),
            price: dec!(1.0844),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            candle: None,
        };
        tx.send(tick.clone()).await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), tick);

        drop(tx);
        handle.await.unwrap();
        assert_eq!(latest.get("EURUSD").await, Some(tick));
    }
}

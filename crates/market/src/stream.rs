use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tracing::{info, warn};
use url::Url;

use common::{normalize_symbol, price_from_f64, Candle, Error, PriceTick, Result};

/// WebSocket client for the live upstream tick feed.
///
/// Parses each text frame into a `PriceTick` and forwards it on an mpsc
/// channel. Reconnects after a fixed delay, forever, until the receiving
/// side is dropped.
pub struct UpstreamStream {
    url: String,
    retry_delay: Duration,
    tick_tx: mpsc::Sender<PriceTick>,
}

impl UpstreamStream {
    pub fn new(
        url: impl Into<String>,
        retry_delay: Duration,
        tick_tx: mpsc::Sender<PriceTick>,
    ) -> Self {
        Self {
            url: url.into(),
            retry_delay,
            tick_tx,
        }
    }

    /// Run the stream loop. Call this inside a `tokio::spawn`.
    pub async fn run(self) {
        loop {
            if self.tick_tx.is_closed() {
                info!("Tick receiver dropped, stopping upstream stream");
                return;
            }
            info!(url = %self.url, "Connecting to upstream feed");
            match self.connect_once().await {
                Ok(()) => {
                    info!(retry = ?self.retry_delay, "Upstream feed closed, reconnecting");
                }
                Err(e) => {
                    warn!(error = %e, retry = ?self.retry_delay, "Upstream feed error, reconnecting");
                }
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn connect_once(&self) -> Result<()> {
        let url = Url::parse(&self.url).map_err(|e| Error::WebSocket(e.to_string()))?;
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        info!("Upstream feed connected");

        let (_, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            let msg = msg.map_err(|e| Error::WebSocket(e.to_string()))?;

            if let tokio_tungstenite::tungstenite::Message::Text(text) = msg {
                match parse_tick(&text) {
                    Ok(Some(tick)) => {
                        if self.tick_tx.send(tick).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "Failed to parse upstream message");
                    }
                }
            }
        }

        Ok(())
    }
}

// ─── Upstream JSON parsing ───────────────────────────────────────────────────

/// Parse one upstream message.
///
/// Candle messages look like
/// `{"symbol": "EURUSD_OTC", "open": 1.1, "close": 1.2, "max": 1.3, "min": 1.0, "from": 1700000000}`;
/// plain ticks carry `asset`/`price` instead. Messages without a symbol
/// (heartbeats, acks) yield `None`.
pub fn parse_tick(text: &str) -> Result<Option<PriceTick>> {
    let value: Value = serde_json::from_str(text)?;
    let Some(symbol) = ["symbol", "asset"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
    else {
        return Ok(None);
    };

    let price = number(&value, &["close", "price"])
        .ok_or_else(|| Error::InvalidPrice(format!("no price for {symbol}")))?;
    let price = price_from_f64(price)?;

    let timestamp = number(&value, &["from", "timestamp", "time"])
        .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single())
        .unwrap_or_else(Utc::now);

    let candle = match (
        number(&value, &["open"]),
        number(&value, &["max", "high"]),
        number(&value, &["min", "low"]),
    ) {
        (Some(open), Some(high), Some(low)) => Some(Candle::new(
            price_from_f64(open)?,
            price_from_f64(high)?,
            price_from_f64(low)?,
            price,
            timestamp,
        )),
        _ => None,
    };

    Ok(Some(PriceTick {
        asset: normalize_symbol(symbol),
        price,
        timestamp,
        candle,
    }))
}

/// First of `keys` present as a number.
fn number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_f64))
}

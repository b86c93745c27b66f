use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use common::PriceTick;

/// Per-subscriber channel capacity.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("subscriber is not keeping up")]
    Full,
    #[error("subscriber disconnected")]
    Closed,
}

/// One live-feed subscriber.
pub trait TickSink: Send {
    /// Hand over a tick without waiting. Any error drops the subscriber.
    fn deliver(&mut self, tick: &PriceTick) -> Result<(), DeliveryError>;
}

/// Bounded channel to a client task (e.g. a WebSocket writer).
pub struct ChannelSink {
    tx: mpsc::Sender<PriceTick>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<PriceTick>) -> Self {
        Self { tx }
    }
}

impl TickSink for ChannelSink {
    fn deliver(&mut self, tick: &PriceTick) -> Result<(), DeliveryError> {
        self.tx.try_send(tick.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Registry of live-feed subscribers and fan-out of incoming ticks.
///
/// Clone-able via internal Arc; every clone shares one registry.
#[derive(Clone)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<HashMap<Uuid, Box<dyn TickSink>>>>,
    capacity: usize,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Register a channel subscriber and return its receiving end.
    pub async fn subscribe(&self) -> (Uuid, mpsc::Receiver<PriceTick>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.register(Box::new(ChannelSink::new(tx))).await;
        (id, rx)
    }

    pub async fn register(&self, sink: Box<dyn TickSink>) -> Uuid {
        let id = Uuid::new_v4();
        let mut subscribers = self.subscribers.lock().await;
        subscribers.insert(id, sink);
        info!(subscriber = %id, total = subscribers.len(), "Feed subscriber added");
        id
    }

    /// Returns `false` when `id` was already gone (e.g. dropped by a
    /// failed delivery).
    pub async fn unsubscribe(&self, id: Uuid) -> bool {
        let mut subscribers = self.subscribers.lock().await;
        let removed = subscribers.remove(&id).is_some();
        if removed {
            info!(subscriber = %id, total = subscribers.len(), "Feed subscriber removed");
        }
        removed
    }

    /// Deliver `tick` to every subscriber. Subscribers that fail are removed.
    /// Returns the number of successful deliveries.
    pub async fn broadcast(&self, tick: &PriceTick) -> usize {
        let mut subscribers = self.subscribers.lock().await;
        let mut failed = Vec::new();

        for (id, sink) in subscribers.iter_mut() {
            if let Err(e) = sink.deliver(tick) {
                failed.push((*id, e));
            }
        }

        for (id, reason) in &failed {
            subscribers.remove(id);
            info!(subscriber = %id, reason = %reason, "Feed subscriber dropped");
        }

        let delivered = subscribers.len();
        debug!(asset = %tick.asset, delivered, dropped = failed.len(), "Tick broadcast");
        delivered
    }

    pub async fn len(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub mod broadcaster;
pub mod cache;
pub mod relay;

pub use broadcaster::{Broadcaster, ChannelSink, DeliveryError, TickSink};
pub use cache::LatestCandles;
pub use relay::Relay;

mod feed;
mod health;
mod otc;
mod signals;

pub use feed::feed_router;
pub use health::health_router;
pub use otc::otc_router;
pub use signals::signals_router;

pub mod candles;
pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use candles::{price_from_f64, Bar, Candle, CandleSeries, RawCandle};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use source::MarketDataSource;
pub use types::*;

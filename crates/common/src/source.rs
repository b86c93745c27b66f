use async_trait::async_trait;

use crate::{IndicatorSnapshot, RawCandle, Result};

/// Abstraction over the market data provider.
///
/// `FmpClient` in `crates/market` implements this against the REST API.
/// Implementations own transport concerns (keys, rate limits, timeouts,
/// retries); the core never retries a failed call. Failures surface as
/// `Error::DataSource`.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Recent candles for `asset`, in whatever order the provider returns.
    async fn candles(&self, asset: &str, timeframe: &str, limit: usize) -> Result<Vec<RawCandle>>;

    /// Latest provider-side indicator readings, `None` when unavailable.
    async fn indicators(&self, asset: &str, timeframe: &str) -> Result<Option<IndicatorSnapshot>>;
}

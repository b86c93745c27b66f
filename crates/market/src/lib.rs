pub mod fmp;
pub mod stream;

pub use fmp::FmpClient;
pub use stream::UpstreamStream;

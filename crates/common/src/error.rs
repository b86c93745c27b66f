use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient market data: {0}")]
    InsufficientData(String),

    #[error("Indicator unavailable: {0}")]
    IndicatorUnavailable(&'static str),

    #[error("Market data source error: {0}")]
    DataSource(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Machine-readable error class, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    InsufficientData,
    IndicatorUnavailable,
    DataSourceUnavailable,
    InvalidPrice,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Error::InsufficientData(_) => ErrorKind::InsufficientData,
            Error::IndicatorUnavailable(_) => ErrorKind::IndicatorUnavailable,
            Error::DataSource(_) => ErrorKind::DataSourceUnavailable,
            Error::InvalidPrice(_) => ErrorKind::InvalidPrice,
            Error::WebSocket(_) | Error::Config(_) | Error::Json(_) | Error::Io(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_data_errors_have_distinct_kinds() {
        let kinds = [
            Error::InvalidRequest("asset".into()).kind(),
            Error::InsufficientData("no candles".into()).kind(),
            Error::DataSource("timeout".into()).kind(),
        ];
        assert_ne!(kinds[0], kinds[1]);
        assert_ne!(kinds[1], kinds[2]);
        assert_ne!(kinds[0], kinds[2]);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::DataSourceUnavailable).unwrap();
        assert_eq!(json, "\"data_source_unavailable\"");
    }
}

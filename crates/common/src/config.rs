use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Market data provider
    pub fmp_api_key: String,
    pub fmp_base_url: String,
    pub http_timeout: Duration,
    pub candle_limit: usize,

    // Live feed relay; disabled when no upstream URL is configured
    pub feed_url: Option<String>,
    pub feed_retry_delay: Duration,

    // HTTP surface
    pub port: u16,

    // Strategy config file path
    pub strategy_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            fmp_api_key: required_env("FMP_API_KEY"),
            fmp_base_url: optional_env("FMP_BASE_URL")
                .unwrap_or_else(|| "https://financialmodelingprep.com/api/v3".to_string()),
            http_timeout: Duration::from_secs(parsed_env("HTTP_TIMEOUT_SECS", 10)),
            candle_limit: parsed_env("CANDLE_LIMIT", 200),
            feed_url: optional_env("FEED_URL").filter(|v| !v.trim().is_empty()),
            feed_retry_delay: Duration::from_secs(parsed_env("FEED_RETRY_SECS", 5)),
            port: parsed_env("PORT", 10_000),
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategies.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    optional_env(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

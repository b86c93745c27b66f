use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use common::{Error, Result};

use crate::indicators::IndicatorSettings;

/// Top-level strategy config file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [indicators]
/// rsi_period = 14
/// fast_period = 10
/// slow_period = 50
///
/// [[strategy]]
/// type = "confluence"
/// name = "confluence"
///
/// [strategy.params]
/// preset = "standard"
/// trend_policy = "price_vs_slow_sma"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy", default)]
    pub strategies: Vec<StrategyDefinition>,
    /// Periods for indicators derived from candle history.
    #[serde(default)]
    pub indicators: IndicatorSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyDefinition {
    /// One of "breakout", "confluence", "engulfing" or "rsi_sma".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Name callers select the strategy by.
    pub name: String,
    /// Strategy-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl StrategyFileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Load from `path`, or fall back to an empty file (the built-in
    /// strategy set) when it does not exist. A file that exists but fails to
    /// parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Strategy config not found, using built-in strategies");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

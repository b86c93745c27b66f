use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use common::{Error, Result, TrendPolicy};

use crate::config::{StrategyDefinition, StrategyFileConfig};
use crate::indicators::IndicatorSettings;
use crate::{
    BreakoutAnchor, BreakoutStrategy, ConfluenceStrategy, ConfluenceThresholds,
    EngulfingStrategy, RsiSmaStrategy, RsiSmaThresholds, Strategy,
};

/// Named strategy instances shared by every request.
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn Strategy>>,
    default: String,
    indicators: IndicatorSettings,
}

impl StrategyRegistry {
    /// Strategy used when a request names none.
    pub const DEFAULT_STRATEGY: &'static str = "confluence";

    /// Build the registry from config. An empty file yields the built-in set.
    pub fn from_config(file_cfg: &StrategyFileConfig) -> Result<Self> {
        if file_cfg.strategies.is_empty() {
            let mut registry = Self::builtin();
            registry.indicators = file_cfg.indicators.clone();
            return Ok(registry);
        }

        let mut strategies: Vec<Arc<dyn Strategy>> = Vec::new();
        for def in &file_cfg.strategies {
            if strategies.iter().any(|s| s.name() == def.name) {
                return Err(Error::Config(format!("duplicate strategy name '{}'", def.name)));
            }
            let strategy = build_strategy(def)?;
            info!(name = %strategy.name(), kind = %def.strategy_type, "Registered strategy");
            strategies.push(strategy);
        }

        let default = strategies
            .iter()
            .map(|s| s.name())
            .find(|name| *name == Self::DEFAULT_STRATEGY)
            .unwrap_or_else(|| strategies[0].name())
            .to_string();

        Ok(Self {
            strategies,
            default,
            indicators: file_cfg.indicators.clone(),
        })
    }

    /// Every strategy type with its default parameters.
    pub fn builtin() -> Self {
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(ConfluenceStrategy::new(
                Self::DEFAULT_STRATEGY,
                ConfluenceThresholds::standard(),
            )),
            Arc::new(ConfluenceStrategy::new(
                "confluence_strict",
                ConfluenceThresholds::strict(),
            )),
            Arc::new(BreakoutStrategy::new("breakout", BreakoutAnchor::default())),
            Arc::new(BreakoutStrategy::new("breakout_open", BreakoutAnchor::BreakoutOpen)),
            Arc::new(EngulfingStrategy::new("engulfing")),
            Arc::new(RsiSmaStrategy::new("rsi_sma", RsiSmaThresholds::default())),
        ];
        Self {
            strategies,
            default: Self::DEFAULT_STRATEGY.to_string(),
            indicators: IndicatorSettings::default(),
        }
    }

    /// Look up by name; `None` selects the default strategy.
    pub fn get(&self, name: Option<&str>) -> Option<Arc<dyn Strategy>> {
        let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(&self.default);
        self.strategies.iter().find(|s| s.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn indicators(&self) -> &IndicatorSettings {
        &self.indicators
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .field("default", &self.default)
            .finish()
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(def: &StrategyDefinition) -> Result<Arc<dyn Strategy>> {
    let params = &def.params;
    match def.strategy_type.as_str() {
        "breakout" => {
            let anchor = match param_str(params, "anchor") {
                Some(s) => BreakoutAnchor::from_str(s)?,
                None => BreakoutAnchor::default(),
            };
            Ok(Arc::new(BreakoutStrategy::new(&def.name, anchor)))
        }
        "confluence" => {
            let mut thresholds = match param_str(params, "preset") {
                Some(preset) => ConfluenceThresholds::preset(preset).ok_or_else(|| {
                    Error::Config(format!("unknown confluence preset '{preset}'"))
                })?,
                None => ConfluenceThresholds::standard(),
            };
            thresholds.rsi_call_below =
                param_decimal(params, "rsi_call_below", thresholds.rsi_call_below);
            thresholds.rsi_put_above =
                param_decimal(params, "rsi_put_above", thresholds.rsi_put_above);
            thresholds.proximity = param_decimal(params, "proximity", thresholds.proximity);

            let policy = match param_str(params, "trend_policy") {
                Some(s) => TrendPolicy::from_str(s)?,
                None => TrendPolicy::default(),
            };
            let mut strategy =
                ConfluenceStrategy::new(&def.name, thresholds).with_trend_policy(policy);
            if let Some(window) = param_usize(params, "level_window") {
                strategy = strategy.with_level_window(window);
            }
            Ok(Arc::new(strategy))
        }
        "engulfing" => Ok(Arc::new(EngulfingStrategy::new(&def.name))),
        "rsi_sma" => {
            let d = RsiSmaThresholds::default();
            let thresholds = RsiSmaThresholds {
                strong_overbought: param_decimal(params, "strong_overbought", d.strong_overbought),
                strong_oversold: param_decimal(params, "strong_oversold", d.strong_oversold),
                overbought: param_decimal(params, "overbought", d.overbought),
                oversold: param_decimal(params, "oversold", d.oversold),
                strong_confidence: param_decimal(params, "strong_confidence", d.strong_confidence),
                weak_confidence: param_decimal(params, "weak_confidence", d.weak_confidence),
            };
            Ok(Arc::new(RsiSmaStrategy::new(&def.name, thresholds)))
        }
        other => Err(Error::Config(format!(
            "unknown strategy type '{other}' for '{}'",
            def.name
        ))),
    }
}

fn param_decimal(params: &HashMap<String, toml::Value>, key: &str, default: Decimal) -> Decimal {
    params
        .get(key)
        .and_then(|v| match v {
            toml::Value::Float(f) => Decimal::from_str(&f.to_string()).ok(),
            toml::Value::Integer(i) => Some(Decimal::from(*i)),
            toml::Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        })
        .unwrap_or(default)
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str) -> Option<usize> {
    params
        .get(key)
        .and_then(|v| v.as_integer())
        .and_then(|v| usize::try_from(v).ok())
}

fn param_str<'a>(params: &'a HashMap<String, toml::Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::{
    normalize_symbol, CandleSeries, Error, IndicatorSnapshot, MarketDataSource, Result,
    ScanOrder, Signal, SignalFilter, StrategyConfig, TrendFilter, TrendPolicy,
};

use crate::outcome::{ForwardClose, Outcome, OutcomeEvaluator};
use crate::registry::StrategyRegistry;
use crate::scanner::SignalScanner;

/// Upper bound for `num_signals`.
pub const MAX_SIGNALS_PER_REQUEST: usize = 100;

/// Upper bound for `outcome_horizon`, in bars.
pub const MAX_OUTCOME_HORIZON: usize = 500;

/// Inbound request, as decoded from JSON. Everything is optional here so
/// missing fields surface as `InvalidRequest` with a useful message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignalRequest {
    #[serde(alias = "symbol")]
    pub asset: Option<String>,
    pub timeframe: Option<String>,
    pub num_signals: Option<i64>,
    pub signal_filter: Option<String>,
    pub trend_filter: Option<String>,
    pub trend_policy: Option<String>,
    pub order: Option<ScanOrder>,
    pub strategy: Option<String>,
    /// Bars ahead at which to judge each signal; omitted means no outcome.
    pub outcome_horizon: Option<usize>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub asset: String,
    pub strategy: Option<String>,
    pub config: StrategyConfig,
    pub outcome_horizon: Option<usize>,
}

impl SignalRequest {
    pub fn for_asset(asset: impl Into<String>) -> Self {
        Self {
            asset: Some(asset.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<ValidatedRequest> {
        let asset = self
            .asset
            .as_deref()
            .map(normalize_symbol)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::InvalidRequest("asset is required".into()))?;

        let requested = self.num_signals.unwrap_or(1);
        let max_signals = usize::try_from(requested)
            .ok()
            .filter(|n| *n <= MAX_SIGNALS_PER_REQUEST)
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "num_signals must be between 1 and {MAX_SIGNALS_PER_REQUEST}, got {requested}"
                ))
            })?;

        let trend_policy = self
            .trend_policy
            .as_deref()
            .map(TrendPolicy::from_str)
            .transpose()
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;

        let outcome_horizon = match self.outcome_horizon {
            Some(h) if !(1..=MAX_OUTCOME_HORIZON).contains(&h) => {
                return Err(Error::InvalidRequest(format!(
                    "outcome_horizon must be between 1 and {MAX_OUTCOME_HORIZON}, got {h}"
                )));
            }
            horizon => horizon,
        };

        let defaults = StrategyConfig::default();
        let config = StrategyConfig {
            timeframe: self
                .timeframe
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(defaults.timeframe),
            trend_filter: TrendFilter::from_str(self.trend_filter.as_deref().unwrap_or(""))?,
            signal_filter: SignalFilter::from_str(self.signal_filter.as_deref().unwrap_or(""))?,
            max_signals,
            trend_policy,
            order: self.order.unwrap_or_default(),
        };

        Ok(ValidatedRequest {
            asset,
            strategy: self.strategy.clone(),
            config,
            outcome_horizon,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedSignal {
    #[serde(flatten)]
    pub signal: Signal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalResponse {
    pub asset: String,
    pub strategy: String,
    pub timeframe: String,
    pub signals: Vec<ReportedSignal>,
    /// Indicator readings as of the newest candle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<IndicatorSnapshot>,
    pub windows_evaluated: usize,
    pub windows_skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Request pipeline: validate, fetch, normalize, scan, judge.
pub struct SignalService {
    source: Arc<dyn MarketDataSource>,
    registry: Arc<StrategyRegistry>,
    scanner: SignalScanner,
    candle_limit: usize,
}

impl SignalService {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        registry: Arc<StrategyRegistry>,
        candle_limit: usize,
    ) -> Self {
        let scanner = SignalScanner::new(registry.indicators().clone());
        Self {
            source,
            registry,
            scanner,
            candle_limit: candle_limit.max(1),
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub async fn generate(&self, request: SignalRequest) -> Result<SignalResponse> {
        let req = request.validate()?;
        let strategy = self.registry.get(req.strategy.as_deref()).ok_or_else(|| {
            Error::InvalidRequest(format!(
                "unknown strategy '{}', expected one of: {}",
                req.strategy.as_deref().unwrap_or_default(),
                self.registry.names().join(", ")
            ))
        })?;
        let timeframe = req.config.timeframe.as_str();

        let (candles, indicators) = tokio::join!(
            self.source.candles(&req.asset, timeframe, self.candle_limit),
            self.source.indicators(&req.asset, timeframe),
        );
        let series = CandleSeries::normalize(candles?);
        let latest = match indicators {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(asset = %req.asset, error = %e, "Indicator fetch failed, deriving from candles");
                None
            }
        };

        let report = self
            .scanner
            .scan(&req.asset, &series, latest.as_ref(), strategy.as_ref(), &req.config)?;

        let evaluator = req.outcome_horizon.map(ForwardClose::new);
        let signals = report
            .signals
            .into_iter()
            .map(|signal| ReportedSignal {
                outcome: evaluator.as_ref().map(|e| e.evaluate(&signal, &series)),
                signal,
            })
            .collect::<Vec<_>>();

        info!(
            asset = %req.asset,
            strategy = strategy.name(),
            candles = series.len(),
            signals = signals.len(),
            "Signals generated"
        );

        Ok(SignalResponse {
            market: self.scanner.latest_snapshot(&series, latest.as_ref()),
            asset: req.asset,
            strategy: strategy.name().to_string(),
            timeframe: req.config.timeframe,
            signals,
            windows_evaluated: report.windows_evaluated,
            windows_skipped: report.windows_skipped,
            notice: report.notice,
        })
    }
}

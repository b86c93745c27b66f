use serde::Serialize;
use tracing::debug;

use common::{
    Candle, CandleSeries, Error, IndicatorSnapshot, Result, ScanOrder, Signal, StrategyConfig,
    TrendFilter,
};

use crate::indicators::IndicatorSettings;
use crate::levels::Level;
use crate::trend;
use crate::{EvalContext, Strategy};

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Signals in scan order (newest first by default), at most `max_signals`.
    pub signals: Vec<Signal>,
    pub windows_evaluated: usize,
    /// Windows skipped because they touched a malformed candle.
    pub windows_skipped: usize,
    /// Set when the series is too short for the strategy's window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Slides a strategy across a candle series and collects filtered signals.
///
/// Stateless between calls: every scan is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct SignalScanner {
    settings: IndicatorSettings,
}

impl SignalScanner {
    pub fn new(settings: IndicatorSettings) -> Self {
        Self { settings }
    }

    /// Scan `series` with `strategy`.
    ///
    /// `latest` is the provider's indicator snapshot; it applies only to the
    /// newest window and overrides the indicators derived from history.
    /// The trend filter and the strategy's trend scoring share one policy:
    /// the request's if given, else the strategy's own.
    /// Fails only on an empty series.
    pub fn scan(
        &self,
        asset: &str,
        series: &CandleSeries,
        latest: Option<&IndicatorSnapshot>,
        strategy: &dyn Strategy,
        cfg: &StrategyConfig,
    ) -> Result<ScanReport> {
        if series.is_empty() {
            return Err(Error::InsufficientData(format!("no candles for {asset}")));
        }

        let size = strategy.window().max(1);
        let mut report = ScanReport::default();
        if series.len() < size {
            report.notice = Some(format!(
                "{} needs {size} candles, got {}",
                strategy.name(),
                series.len()
            ));
            return Ok(report);
        }

        let policy = cfg
            .trend_policy
            .or_else(|| strategy.trend_policy())
            .unwrap_or_default();
        let history = History::new(series, &self.settings);
        let ends: Box<dyn Iterator<Item = usize>> = match cfg.order {
            ScanOrder::NewestFirst => Box::new((size - 1..series.len()).rev()),
            ScanOrder::OldestFirst => Box::new(size - 1..series.len()),
        };

        for end in ends {
            let Some(window) = series.window(end, size) else {
                report.windows_skipped += 1;
                continue;
            };
            let Some(ctx) = history.context_at(end, latest, strategy.level_window()) else {
                report.windows_skipped += 1;
                continue;
            };
            let ctx = ctx.with_trend_policy(policy);
            report.windows_evaluated += 1;

            let eval = strategy.evaluate(&window, &ctx);
            if !eval.kind.is_actionable() || !cfg.signal_filter.accepts(eval.kind) {
                continue;
            }
            if cfg.trend_filter != TrendFilter::Any {
                let trend = trend::classify(policy, &ctx.snapshot).ok();
                if !cfg.trend_filter.accepts(trend) {
                    continue;
                }
            }

            let timestamp = window[window.len() - 1].timestamp;
            report.signals.push(eval.into_signal(asset, timestamp));
            if report.signals.len() >= cfg.max_signals.get() {
                break;
            }
        }

        debug!(
            asset,
            strategy = strategy.name(),
            ?policy,
            evaluated = report.windows_evaluated,
            skipped = report.windows_skipped,
            signals = report.signals.len(),
            "Scan complete"
        );
        Ok(report)
    }

    /// Snapshot of the newest bar, for echoing back to the caller.
    pub fn latest_snapshot(
        &self,
        series: &CandleSeries,
        latest: Option<&IndicatorSnapshot>,
    ) -> Option<IndicatorSnapshot> {
        let end = series.len().checked_sub(1)?;
        let derived = self.settings.derive_snapshot(&series.candles_until(end))?;
        Some(match latest {
            Some(provided) => provided.clone().or(&derived),
            None => derived,
        })
    }
}

/// Valid candles of one series and their derived indicators, built once
/// per scan so each window only slices into it.
struct History {
    candles: Vec<Candle>,
    /// `valid[end]`: number of valid candles among bars `0..=end`.
    valid: Vec<usize>,
    /// `snapshots[k]`: indicators as of `candles[k]`.
    snapshots: Vec<IndicatorSnapshot>,
}

impl History {
    fn new(series: &CandleSeries, settings: &IndicatorSettings) -> Self {
        let mut candles = Vec::with_capacity(series.len());
        let mut valid = Vec::with_capacity(series.len());
        for bar in series.bars() {
            if let Some(candle) = bar.candle() {
                candles.push(*candle);
            }
            valid.push(candles.len());
        }
        let snapshots = settings.derive_snapshots(&candles);
        Self {
            candles,
            valid,
            snapshots,
        }
    }

    /// Context as of bar `end`: indicators derived from the candles up to
    /// it, overridden by `latest` on the newest bar.
    fn context_at(
        &self,
        end: usize,
        latest: Option<&IndicatorSnapshot>,
        level_window: Option<usize>,
    ) -> Option<EvalContext> {
        let n = *self.valid.get(end)?;
        let derived = self.snapshots.get(n.checked_sub(1)?)?;
        let snapshot = match latest {
            Some(provided) if end + 1 == self.valid.len() => provided.clone().or(derived),
            _ => derived.clone(),
        };
        let level = level_window.and_then(|w| Level::locate_partial(&self.candles[..n], w));
        Some(EvalContext::new(snapshot).with_level(level))
    }
}

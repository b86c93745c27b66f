use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use common::{
    normalize_symbol, price_from_f64, Error, IndicatorSnapshot, MarketDataSource, RawCandle,
    Result,
};

/// REST client for the Financial Modeling Prep API.
///
/// Candles come from `historical-chart/{timeframe}/{symbol}`, indicator
/// readings from `technical_indicator/{timeframe}/{symbol}`. Both return
/// newest-first arrays.
pub struct FmpClient {
    api_key: String,
    base_url: String,
    http: Client,
    rsi_period: usize,
    fast_period: usize,
    slow_period: usize,
}

impl FmpClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            rsi_period: 14,
            fast_period: 10,
            slow_period: 50,
        })
    }

    /// Periods requested from the indicator endpoint.
    pub fn with_periods(mut self, rsi: usize, fast: usize, slow: usize) -> Self {
        self.rsi_period = rsi;
        self.fast_period = fast;
        self.slow_period = slow;
        self
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}/{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| Error::DataSource(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::DataSource(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(Error::DataSource(format!("HTTP {status} from {path}")));
        }
        Ok(body)
    }

    /// Newest row of one technical indicator.
    async fn indicator(
        &self,
        symbol: &str,
        timeframe: &str,
        kind: &str,
        period: usize,
    ) -> Result<Option<Value>> {
        let path = format!("technical_indicator/{timeframe}/{symbol}");
        let body = self
            .get(&path, &[("type", kind.to_string()), ("period", period.to_string())])
            .await?;
        Ok(parse_rows::<Value>(&body)?.into_iter().next())
    }
}

#[async_trait]
impl MarketDataSource for FmpClient {
    async fn candles(&self, asset: &str, timeframe: &str, limit: usize) -> Result<Vec<RawCandle>> {
        let symbol = normalize_symbol(asset);
        debug!(symbol = %symbol, timeframe, limit, "Fetching candles");
        let body = self
            .get(&format!("historical-chart/{timeframe}/{symbol}"), &[])
            .await?;
        let rows = parse_rows::<ChartRow>(&body)?;
        Ok(rows.into_iter().take(limit).map(ChartRow::into_raw).collect())
    }

    async fn indicators(&self, asset: &str, timeframe: &str) -> Result<Option<IndicatorSnapshot>> {
        let symbol = normalize_symbol(asset);
        debug!(symbol = %symbol, timeframe, "Fetching indicators");
        let (rsi, fast, slow) = tokio::try_join!(
            self.indicator(&symbol, timeframe, "rsi", self.rsi_period),
            self.indicator(&symbol, timeframe, "sma", self.fast_period),
            self.indicator(&symbol, timeframe, "sma", self.slow_period),
        )?;
        Ok(snapshot_from_rows(rsi.as_ref(), fast.as_ref(), slow.as_ref()))
    }
}

// ─── FMP JSON parsing ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartRow {
    date: Option<String>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
}

impl ChartRow {
    fn into_raw(self) -> RawCandle {
        RawCandle {
            timestamp: self.date.as_deref().and_then(parse_fmp_date),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }
}

/// FMP answers errors with `{"Error Message": "..."}` and a 200 status.
fn parse_rows<T: serde::de::DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::DataSource(format!("malformed response: {e}")))?;
    if let Some(msg) = value.get("Error Message").and_then(Value::as_str) {
        return Err(Error::DataSource(msg.to_string()));
    }
    serde_json::from_value(value).map_err(|e| Error::DataSource(format!("unexpected response: {e}")))
}

/// `2023-10-10 15:59:00` for intraday rows, `2023-10-10` for daily ones.
fn parse_fmp_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc())
}

fn decimal_field(row: Option<&Value>, field: &str) -> Option<rust_decimal::Decimal> {
    row?.get(field)?.as_f64().and_then(|v| price_from_f64(v).ok())
}

fn snapshot_from_rows(
    rsi: Option<&Value>,
    fast: Option<&Value>,
    slow: Option<&Value>,
) -> Option<IndicatorSnapshot> {
    let price = [rsi, fast, slow]
        .into_iter()
        .find_map(|row| decimal_field(row, "close"))?;
    Some(IndicatorSnapshot {
        price,
        rsi: decimal_field(rsi, "rsi"),
        sma_fast: decimal_field(fast, "sma"),
        sma_slow: decimal_field(slow, "sma"),
    })
}

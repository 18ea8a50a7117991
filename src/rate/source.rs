use std::fmt::Debug;

use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::Rate;
use crate::utils::error_chain_fmt;

/// The upstream feeds we know how to parse. Each one has its own JSON shape;
/// see `RateProvider::extract_rate`.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RateProvider {
    /// klines: `[[open_time, "open", "high", "low", "close", ...]]`
    Binance,
    /// simple price: `{"bitcoin": {"uah": 123.0}}`
    Coingecko,
    /// tickers: `[["btcuah", bid, bid_size, ask, ask_size, change, change_pct,
    /// last_price, volume, ...]]`
    Kuna,
}

const BINANCE_MIN_ITEMS: usize = 5;
const BINANCE_RATE_INDEX: usize = 4;
const KUNA_MIN_ITEMS: usize = 9;
const KUNA_RATE_INDEX: usize = 7;
const COINGECKO_FROM: &str = "bitcoin";
const COINGECKO_TO: &str = "uah";

impl RateProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Coingecko => "coingecko",
            Self::Kuna => "kuna",
        }
    }

    /// Parse a 200 response body into a `Rate`.
    ///
    /// Wrong shape or too few fields is `UnexpectedResponseFormat`; a field of
    /// the wrong type (or a negative/non-finite number) is
    /// `UnexpectedRateFormat`.
    pub fn extract_rate(
        &self,
        body: &str,
    ) -> Result<Rate, RateError> {
        let value = match self {
            Self::Binance => {
                match first_row_item(body, BINANCE_MIN_ITEMS, BINANCE_RATE_INDEX)? {
                    // binance quotes prices as strings
                    Value::String(s) => s
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| RateError::UnexpectedRateFormat)?,
                    _ => return Err(RateError::UnexpectedRateFormat),
                }
            }
            Self::Kuna => first_row_item(body, KUNA_MIN_ITEMS, KUNA_RATE_INDEX)?
                .as_f64()
                .ok_or(RateError::UnexpectedRateFormat)?,
            Self::Coingecko => {
                let data: Value = serde_json::from_str(body)
                    .map_err(|e| RateError::UnexpectedResponseFormat(e.to_string()))?;
                data.get(COINGECKO_FROM)
                    .and_then(|currencies| currencies.get(COINGECKO_TO))
                    .ok_or_else(|| {
                        RateError::UnexpectedResponseFormat(format!(
                            "missing {COINGECKO_FROM}.{COINGECKO_TO}"
                        ))
                    })?
                    .as_f64()
                    .ok_or(RateError::UnexpectedRateFormat)?
            }
        };

        match value.is_finite() && value >= 0.0 {
            true => Ok(Rate::new(value)),
            false => Err(RateError::UnexpectedRateFormat),
        }
    }
}

/// For the array-of-arrays feeds: take item `index` of the first row, which
/// must have at least `min_items` items
fn first_row_item(
    body: &str,
    min_items: usize,
    index: usize,
) -> Result<Value, RateError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| RateError::UnexpectedResponseFormat(e.to_string()))?;
    let mut row = rows
        .into_iter()
        .next()
        .filter(|row| row.len() >= min_items)
        .ok_or_else(|| {
            RateError::UnexpectedResponseFormat(format!(
                "expected at least {min_items} items in the first row"
            ))
        })?;
    Ok(row.swap_remove(index))
}

#[derive(thiserror::Error)]
pub enum RateError {
    /// Also covers client timeouts and failures while reading the body
    #[error("http request failure")]
    SourceUnreachable(#[source] reqwest::Error),
    #[error("unexpected status code: {code}")]
    UnexpectedStatus { code: u16 },
    #[error("unexpected response format: {0}")]
    UnexpectedResponseFormat(String),
    #[error("unexpected exchange rate format")]
    UnexpectedRateFormat,
}

impl Debug for RateError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// A failed fetch still carries the source's configured default rate, so that
/// callers always have a concrete value to report.
#[derive(thiserror::Error)]
#[error("rate source {source_name} failed")]
pub struct FetchFailure {
    pub source_name: &'static str,
    pub default_rate: Rate,
    #[source]
    pub error: RateError,
}

impl Debug for FetchFailure {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// One upstream feed: where to find it, how to parse it, and what to report
/// when it fails.
#[derive(Clone, Debug)]
pub struct RateSource {
    provider: RateProvider,
    url: String,
    default_rate: Rate,
    // `Client` is an `Arc` internally; all sources share one connection pool
    http_client: Client,
}

impl RateSource {
    pub fn new(
        provider: RateProvider,
        url: String,
        default_rate: Rate,
        http_client: Client,
    ) -> Self {
        Self {
            provider,
            url,
            default_rate,
            http_client,
        }
    }

    pub fn name(&self) -> &'static str { self.provider.name() }

    pub fn default_rate(&self) -> Rate { self.default_rate }

    /// `GET` the feed and parse the response. On any error, the configured
    /// default rate is returned alongside the error.
    #[tracing::instrument(name = "Fetching exchange rate", skip(self), fields(source = %self.name()))]
    pub async fn fetch_rate(&self) -> Result<Rate, FetchFailure> {
        self.try_fetch_rate()
            .await
            .map_err(|error| FetchFailure {
                source_name: self.name(),
                default_rate: self.default_rate,
                error,
            })
    }

    async fn try_fetch_rate(&self) -> Result<Rate, RateError> {
        let resp = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(RateError::SourceUnreachable)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(RateError::UnexpectedStatus {
                code: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(RateError::SourceUnreachable)?;
        tracing::debug!(response = %body, "{} responded", self.name());

        self.provider.extract_rate(&body)
    }
}

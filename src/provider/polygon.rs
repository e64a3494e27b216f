use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{MarketDataProvider, ProviderError, ProviderResult};
use crate::model::{PriceHistoryBar, PutQuote};

const API_URL: &str = "https://api.polygon.io";
/// Env var holding the API key.
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";
const SNAPSHOT_PAGE_LIMIT: u32 = 250;
const MAX_SNAPSHOT_PAGES: usize = 40;

// ── API response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LastTradeResponse {
    results: Option<LastTrade>,
}

#[derive(Debug, Deserialize)]
struct LastTrade {
    #[serde(rename = "p")]
    price: f64,
}

#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    results: Vec<AggBar>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "t")]
    timestamp_ms: i64,
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    #[serde(default)]
    results: Vec<SnapshotContract>,
    next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotContract {
    details: Option<ContractDetails>,
    last_quote: Option<LastQuote>,
}

#[derive(Debug, Deserialize)]
struct ContractDetails {
    strike_price: Option<f64>,
    expiration_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LastQuote {
    bid: Option<f64>,
    ask: Option<f64>,
}

// ── Provider ─────────────────────────────────────────────────────────

/// Polygon.io REST client.
///
/// Calls are async internally and driven to completion on a private runtime,
/// so the provider can be used from plain (or rayon) threads.
pub struct PolygonProvider {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl PolygonProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("put-spread-scanner/0.1")
            .build()
            .context("creating HTTP client")?;
        let runtime = tokio::runtime::Runtime::new().context("creating async runtime")?;

        Ok(Self {
            client,
            runtime,
            api_key: api_key.into(),
            base_url: API_URL.to_string(),
            max_retries: 3,
        })
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            anyhow::anyhow!(
                "{API_KEY_ENV} env var not set. \
                 Set it to your Polygon.io API key, or scan offline with --data-dir."
            )
        })?;
        Self::new(api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, ticker: &str) -> ProviderResult<T> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        retry(self.max_retries, || {
            let client = client.clone();
            let api_key = api_key.clone();
            async move {
                let resp = client
                    .get(url)
                    .query(&[("apiKey", api_key.as_str())])
                    .send()
                    .await
                    .map_err(|e| ProviderError::Network(e.to_string()))?;

                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(classify_status(status.as_u16(), ticker, body));
                }

                resp.json::<T>()
                    .await
                    .map_err(|e| ProviderError::Malformed(e.to_string()))
            }
        })
        .await
    }

    async fn fetch_last_trade(&self, ticker: &str) -> ProviderResult<f64> {
        let url = format!("{}/v2/last/trade/{}", self.base_url, ticker);
        let resp: LastTradeResponse = self.get_json(&url, ticker).await?;
        resp.results
            .map(|t| t.price)
            .ok_or_else(|| ProviderError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    async fn fetch_previous_close(&self, ticker: &str) -> ProviderResult<f64> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", self.base_url, ticker);
        let resp: AggsResponse = self.get_json(&url, ticker).await?;
        resp.results
            .last()
            .map(|b| b.close)
            .ok_or_else(|| ProviderError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    /// Last trade, falling back to the previous close on plans without trade access.
    pub async fn fetch_spot(&self, ticker: &str) -> ProviderResult<f64> {
        match self.fetch_last_trade(ticker).await {
            Err(ProviderError::Auth(msg)) => {
                debug!(ticker, %msg, "last trade not authorized; using previous close");
                self.fetch_previous_close(ticker).await
            }
            other => other,
        }
    }

    pub async fn fetch_history(&self, ticker: &str, lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
        let end = today();
        let start = end
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}?adjusted=true&sort=asc&limit=50000",
            self.base_url, ticker, start, end
        );
        let resp: AggsResponse = self.get_json(&url, ticker).await?;

        resp.results
            .into_iter()
            .map(|bar| {
                let date = chrono::DateTime::from_timestamp_millis(bar.timestamp_ms)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| {
                        ProviderError::Malformed(format!("bad bar timestamp {}", bar.timestamp_ms))
                    })?;
                Ok(PriceHistoryBar::new(date, bar.close))
            })
            .collect()
    }

    pub async fn fetch_puts(&self, ticker: &str, min_dte: i64, max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
        let today = today();
        let from = offset_date(today, min_dte);
        let to = offset_date(today, max_dte);

        let mut url = format!(
            "{}/v3/snapshot/options/{}?contract_type=put&expiration_date.gte={}&expiration_date.lte={}&limit={}",
            self.base_url, ticker, from, to, SNAPSHOT_PAGE_LIMIT
        );
        let mut quotes = Vec::new();

        for _ in 0..MAX_SNAPSHOT_PAGES {
            let page: SnapshotResponse = self.get_json(&url, ticker).await?;
            quotes.extend(page.results.into_iter().filter_map(|c| to_quote(c, today)));

            match page.next_url {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        Ok(quotes)
    }
}

impl MarketDataProvider for PolygonProvider {
    fn spot_price(&self, ticker: &str) -> ProviderResult<f64> {
        self.block_on(self.fetch_spot(ticker))
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
        self.block_on(self.fetch_history(ticker, lookback_days))
    }

    fn put_chain(&self, ticker: &str, min_dte: i64, max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
        self.block_on(self.fetch_puts(ticker, min_dte, max_dte))
    }
}

// ── Internal helpers ─────────────────────────────────────────────────

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn offset_date(from: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        from.checked_add_days(Days::new(days as u64)).unwrap_or(NaiveDate::MAX)
    } else {
        from.checked_sub_days(Days::new(days.unsigned_abs())).unwrap_or(NaiveDate::MIN)
    }
}

/// Contracts without a two-sided quote are dropped here; the chain filter does the rest.
fn to_quote(contract: SnapshotContract, today: NaiveDate) -> Option<PutQuote> {
    let details = contract.details?;
    let quote = contract.last_quote?;
    let expiration = NaiveDate::parse_from_str(details.expiration_date.as_deref()?, "%Y-%m-%d").ok()?;

    Some(PutQuote {
        strike: details.strike_price?,
        expiration,
        days_to_expiration: (expiration - today).num_days(),
        bid: quote.bid?,
        ask: quote.ask?,
    })
}

fn classify_status(status: u16, ticker: &str, body: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(format!("HTTP {status}: {body}")),
        404 => ProviderError::NotFound {
            ticker: ticker.to_string(),
        },
        429 => ProviderError::RateLimited(format!("HTTP {status}")),
        _ => ProviderError::Network(format!("HTTP {status}: {body}")),
    }
}

/// 500ms doubled per attempt, saturating instead of overflowing.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(2u64.saturating_pow(attempt).saturating_mul(500))
}

/// Retry transient failures (network, rate limit) with exponential backoff.
async fn retry<T, F, Fut>(max_retries: u32, f: F) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e @ (ProviderError::Network(_) | ProviderError::RateLimited(_))) if attempt < max_retries => {
                let delay = backoff_delay(attempt);
                debug!(attempt, error = %e, ?delay, "retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

//! Yahoo Finance provider.
//!
//! Daily history comes from the chart API through `yahoo_finance_api`.
//! Company websites come from the quoteSummary API, which needs a cookie and
//! crumb pair obtained from Yahoo before the first request.

use super::{PriceSource, WebsiteSource};
use crate::types::{DateRange, PriceObservation};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::header;
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;
use yahoo_finance_api as yahoo;

const PROVIDER_ID: &str = "YAHOO";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary/";
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Cookie and crumb authorizing quoteSummary requests.
#[derive(Debug, Clone)]
struct Crumb {
    cookie: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    summary_profile: Option<SummaryProfile>,
}

#[derive(Debug, Deserialize)]
struct SummaryProfile {
    website: Option<String>,
}

fn provider_error(message: impl Into<String>) -> Error {
    Error::Provider {
        provider: PROVIDER_ID.to_string(),
        message: message.into(),
    }
}

/// Choose the close to report for one bar.
///
/// The adjusted close is used when preferred and usable, otherwise the raw
/// close. Returns `None` when neither value is a positive finite number.
pub fn pick_close(close: f64, adjclose: f64, prefer_adjusted: bool) -> Option<f64> {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    match (prefer_adjusted, usable(adjclose), usable(close)) {
        (true, true, _) => Some(adjclose),
        (_, _, true) => Some(close),
        (false, true, false) => Some(adjclose),
        _ => None,
    }
}

/// Midnight UTC of a date, as the chart API expects.
fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| Error::InvalidInput(format!("date {} out of range: {}", date, e)))
}

/// Exchange-local calendar date of a bar timestamp.
///
/// `gmt_offset` is the exchange's offset from UTC in seconds, as reported in
/// the chart metadata.
fn timestamp_to_date(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp.checked_add(gmt_offset)?, 0).map(|dt| dt.date_naive())
}

/// Yahoo Finance price and profile provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    client: reqwest::Client,
    prefer_adjusted: bool,
    crumb: RwLock<Option<Crumb>>,
}

impl YahooProvider {
    /// Create a provider.
    ///
    /// # Arguments
    /// * `prefer_adjusted` - Report dividend/split adjusted closes when available
    pub fn new(prefer_adjusted: bool) -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| provider_error(format!("Failed to initialize Yahoo connector: {}", e)))?;

        Ok(Self {
            connector,
            client: reqwest::Client::new(),
            prefer_adjusted,
            crumb: RwLock::new(None),
        })
    }

    async fn ensure_crumb(&self) -> Result<Crumb> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        *self.crumb.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_crumb(&self) -> Result<Crumb> {
        let response = self
            .client
            .get(COOKIE_URL)
            .send()
            .await
            .map_err(|e| provider_error(format!("Failed to get cookie: {}", e)))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| provider_error("Failed to parse Yahoo cookie"))?;

        let value = self
            .client
            .get(CRUMB_URL)
            .header(header::USER_AGENT, BROWSER_AGENT)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| provider_error(format!("Failed to get crumb: {}", e)))?
            .text()
            .await
            .map_err(|e| provider_error(format!("Failed to read crumb: {}", e)))?;

        debug!("Obtained Yahoo crumb");
        Ok(Crumb { cookie, value })
    }

    fn quote_summary_url(symbol: &str, crumb: &str) -> Result<Url> {
        let mut url = Url::parse(QUOTE_SUMMARY_URL)
            .map_err(|e| provider_error(format!("Invalid quoteSummary URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| provider_error("quoteSummary URL cannot have path segments"))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("modules", "summaryProfile")
            .append_pair("crumb", crumb);
        Ok(url)
    }
}

#[async_trait]
impl PriceSource for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_closes(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceObservation>> {
        debug!(
            "Fetching daily closes for {} from {} to {} from Yahoo",
            symbol, range.start, range.end
        );

        let start = to_offset_datetime(range.start)?;
        let end = to_offset_datetime(range.end)?;

        let response = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| {
                if matches!(e, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
                    Error::SymbolNotFound(symbol.to_string())
                } else {
                    provider_error(e.to_string())
                }
            })?;

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(yahoo::YahooError::NoQuotes) => {
                warn!(
                    "No quotes returned for '{}' between {} and {}",
                    symbol, range.start, range.end
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(provider_error(e.to_string())),
        };

        let gmt_offset = match response.metadata() {
            Ok(meta) => meta.gmtoffset as i64,
            Err(e) => {
                debug!("No exchange offset for {}, using UTC dates: {}", symbol, e);
                0
            }
        };

        let observations = quotes
            .into_iter()
            .filter_map(|q| {
                let date = timestamp_to_date(q.timestamp as i64, gmt_offset)?;
                let close = pick_close(q.close, q.adjclose, self.prefer_adjusted)?;
                Some(PriceObservation::new(symbol, date, close))
            })
            .collect();

        Ok(observations)
    }
}

#[async_trait]
impl WebsiteSource for YahooProvider {
    async fn website(&self, symbol: &str) -> Result<Option<String>> {
        let crumb = self.ensure_crumb().await?;
        let url = Self::quote_summary_url(symbol, &crumb.value)?;

        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, BROWSER_AGENT)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| provider_error(format!("Profile request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            *self.crumb.write().await = None;
            return Err(provider_error("Yahoo authentication expired"));
        }
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let data: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| provider_error(format!("Failed to parse profile response: {}", e)))?;

        Ok(data
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|r| r.summary_profile)
            .and_then(|p| p.website)
            .filter(|w| !w.trim().is_empty()))
    }
}

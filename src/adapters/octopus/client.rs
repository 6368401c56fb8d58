//! Octopus Energy REST client
//!
//! Fetches consumption and unit-rate intervals for a stream, following
//! pagination. Every request waits on the shared [`RateLimiter`] first, carries
//! HTTP basic auth (API key as username, empty password) and is bounded by the
//! client timeout.

use super::models::{ConsumptionRecord, Page, RateRecord};
use super::rate_limit::{MinIntervalLimiter, NoopLimiter, RateLimiter};
use crate::adapters::traits::ReadingSource;
use crate::config::{OctopusConfig, SecretString};
use crate::domain::{
    MeterKind, MeterStream, OctographError, ProviderError, RawInterval, Result,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::{header, Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client for the provider API
///
/// # Example
///
/// ```no_run
/// use octograph::adapters::octopus::OctopusClient;
/// use octograph::adapters::ReadingSource;
/// use octograph::config::load_config;
/// use chrono::{Duration, Utc};
///
/// # async fn example() -> octograph::domain::Result<()> {
/// let config = load_config("octograph.toml")?;
/// let client = OctopusClient::new(&config.octopus)?;
///
/// let streams = config.meter_streams().map_err(octograph::domain::OctographError::Configuration)?;
/// let end = Utc::now();
/// let readings = client.fetch_intervals(&streams[0], end - Duration::days(1), end).await?;
/// println!("{} intervals", readings.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OctopusClient {
    base_url: Url,
    client: Client,
    api_key: SecretString,
    page_size: usize,
    max_pages: usize,
    limiter: Arc<dyn RateLimiter>,
}

impl OctopusClient {
    /// Create a client from configuration
    ///
    /// A `min_request_interval_ms` of zero installs a [`NoopLimiter`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &OctopusConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            OctographError::Configuration(format!("Invalid octopus.base_url: {e}"))
        })?;

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("octograph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                OctographError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        let limiter: Arc<dyn RateLimiter> = if config.min_request_interval_ms == 0 {
            Arc::new(NoopLimiter)
        } else {
            Arc::new(MinIntervalLimiter::new(config.min_request_interval()))
        };

        Ok(Self {
            base_url,
            client,
            api_key: config.api_key.clone(),
            page_size: config.page_size,
            max_pages: config.max_pages,
            limiter,
        })
    }

    /// Replace the rate limiter
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Configured API origin
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Basic auth header: API key as username, empty password
    fn auth_header_value(&self) -> String {
        let credentials = format!("{}:", self.api_key.expose_secret().as_ref());
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {encoded}")
    }

    /// URL of the first page for `stream` over `[start, end)`
    pub fn first_page_url(
        &self,
        stream: &MeterStream,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Url> {
        let mp = stream.meter_point.as_str();
        let serial = stream.serial_number.as_str();
        let segments: Vec<&str> = match stream.kind {
            MeterKind::ElectricityConsumption => vec![
                "v1",
                "electricity-meter-points",
                mp,
                "meters",
                serial,
                "consumption",
            ],
            MeterKind::GasConsumption => {
                vec!["v1", "gas-meter-points", mp, "meters", serial, "consumption"]
            }
            MeterKind::ElectricityCost => {
                let codes = stream.tariff_codes.as_ref().ok_or_else(|| {
                    OctographError::Configuration(format!(
                        "Stream {} has no product/tariff codes",
                        stream.id
                    ))
                })?;
                vec![
                    "v1",
                    "products",
                    codes.product_code.as_str(),
                    "electricity-tariffs",
                    codes.tariff_code.as_str(),
                    "standard-unit-rates",
                ]
            }
        };

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                OctographError::Configuration(format!(
                    "octopus.base_url cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments)
            // Trailing slash
            .push("");

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("period_from", &start.to_rfc3339_opts(SecondsFormat::Secs, true))
                .append_pair("period_to", &end.to_rfc3339_opts(SecondsFormat::Secs, true))
                .append_pair("page_size", &self.page_size.to_string());
            if stream.kind != MeterKind::ElectricityCost {
                query.append_pair("order_by", "period");
            }
        }

        Ok(url)
    }

    /// Validate a `next` link: same origin as the configured API and never
    /// seen before in this fetch
    fn next_page_url(&self, next: &str, seen: &mut HashSet<String>) -> Result<Url> {
        let url = Url::parse(next).map_err(|e| {
            ProviderError::InvalidResponse(format!("Unparseable next link '{next}': {e}"))
        })?;

        if url.origin() != self.base_url.origin() {
            return Err(ProviderError::InvalidResponse(format!(
                "Next link leaves the configured origin: {next}"
            ))
            .into());
        }

        if !seen.insert(url.as_str().to_string()) {
            return Err(ProviderError::InvalidResponse(format!(
                "Pagination loop: next link repeated: {next}"
            ))
            .into());
        }

        Ok(url)
    }

    /// GET one JSON document, classifying failures
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        self.limiter.acquire().await;

        tracing::debug!(path = %url.path(), "Requesting provider page");

        let resp = self
            .client
            .get(url.clone())
            .header(header::AUTHORIZATION, self.auth_header_value())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await.map_err(classify_transport_error)?;
            return serde_json::from_str(&body).map_err(|e| {
                ProviderError::InvalidResponse(format!("Malformed JSON from {}: {e}", url.path()))
                    .into()
            });
        }

        let retry_after = parse_retry_after(resp.headers());
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(status, retry_after, url, &body).into())
    }

    /// Fetch one page and convert its records
    async fn fetch_page(
        &self,
        stream: &MeterStream,
        url: &Url,
    ) -> Result<(Vec<RawInterval>, Option<String>)> {
        match stream.kind {
            MeterKind::ElectricityConsumption | MeterKind::GasConsumption => {
                let page: Page<ConsumptionRecord> = self.get_json(url).await?;
                let records = page.results.into_iter().map(|r| r.into_raw(stream)).collect();
                Ok((records, page.next))
            }
            MeterKind::ElectricityCost => {
                let page: Page<RateRecord> = self.get_json(url).await?;
                let records = page.results.into_iter().map(|r| r.into_raw(stream)).collect();
                Ok((records, page.next))
            }
        }
    }

    /// Lazy stream of pages for `stream` over `[start, end)`
    ///
    /// Each item is one page of raw intervals in received order. The stream
    /// ends after the page whose `next` is null; polling it again from scratch
    /// starts over at the first page.
    pub fn interval_pages<'a>(
        &'a self,
        stream: &'a MeterStream,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxStream<'a, Result<Vec<RawInterval>>> {
        let first = match self.first_page_url(stream, start, end) {
            Ok(url) => url,
            Err(e) => return futures::stream::once(async move { Err(e) }).boxed(),
        };

        let cursor = PageCursor {
            seen: HashSet::from([first.as_str().to_string()]),
            next: Some(first),
            pages: 0,
        };

        futures::stream::try_unfold(cursor, move |cursor| self.advance(stream, cursor)).boxed()
    }

    /// Fetch the page under `cursor` and move it on to the next link
    async fn advance(
        &self,
        stream: &MeterStream,
        mut cursor: PageCursor,
    ) -> Result<Option<(Vec<RawInterval>, PageCursor)>> {
        let Some(url) = cursor.next.take() else {
            return Ok(None);
        };

        if cursor.pages >= self.max_pages {
            return Err(ProviderError::InvalidResponse(format!(
                "Stream {} exceeded {} pages",
                stream.id, self.max_pages
            ))
            .into());
        }
        cursor.pages += 1;

        let (records, next) = self.fetch_page(stream, &url).await?;

        tracing::debug!(
            stream_id = %stream.id,
            page = cursor.pages,
            records = records.len(),
            has_next = next.is_some(),
            "Fetched provider page"
        );

        cursor.next = match next {
            Some(link) => Some(self.next_page_url(&link, &mut cursor.seen)?),
            None => None,
        };

        Ok(Some((records, cursor)))
    }
}

struct PageCursor {
    next: Option<Url>,
    pages: usize,
    seen: HashSet<String>,
}

#[async_trait]
impl ReadingSource for OctopusClient {
    async fn fetch_intervals(
        &self,
        stream: &MeterStream,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawInterval>> {
        let pages: Vec<Vec<RawInterval>> = self
            .interval_pages(stream, window_start, window_end)
            .try_collect()
            .await?;

        let page_count = pages.len();
        let intervals: Vec<RawInterval> = pages.into_iter().flatten().collect();

        tracing::debug!(
            stream_id = %stream.id,
            pages = page_count,
            intervals = intervals.len(),
            "Fetched provider intervals"
        );

        Ok(intervals)
    }

    async fn standing_charge(&self, url: &str) -> Result<f64> {
        let url = Url::parse(url).map_err(|e| {
            OctographError::Configuration(format!("Invalid standing charge URL '{url}': {e}"))
        })?;

        let page: Page<RateRecord> = self.get_json(&url).await?;
        page.results
            .first()
            .map(|r| r.value_inc_vat)
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "No standing charge returned by {}",
                    url.path()
                ))
                .into()
            })
    }
}

fn classify_transport_error(err: reqwest::Error) -> OctographError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string()).into()
    } else {
        ProviderError::ConnectionFailed(err.to_string()).into()
    }
}

fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    url: &Url,
    body: &str,
) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationFailed(
            format!("Provider rejected credentials with status {status}"),
        ),
        StatusCode::NOT_FOUND => ProviderError::NotFound(url.path().to_string()),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
        s if s.is_server_error() => ProviderError::ServerError {
            status: s.as_u16(),
            message: truncate(body),
        },
        s => ProviderError::ClientError {
            status: s.as_u16(),
            message: truncate(body),
        },
    }
}

/// `Retry-After` in delta-seconds form
fn parse_retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

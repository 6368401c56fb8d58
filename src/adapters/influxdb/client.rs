//! InfluxDB HTTP writer
//!
//! Sends one line-protocol batch per call to the 2.x (`/api/v2/write`) or 1.x
//! (`/write`) endpoint, and runs Flux queries for the watermark store.

use super::line_protocol::encode_batch;
use crate::adapters::traits::{PointSink, WriteResult};
use crate::config::InfluxDbConfig;
use crate::domain::{DatabaseError, OctographError, Point, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{header, Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use url::Url;

/// Time-series writer for InfluxDB
///
/// # Example
///
/// ```no_run
/// use octograph::adapters::influxdb::InfluxWriter;
/// use octograph::adapters::PointSink;
/// use octograph::config::load_config;
///
/// # async fn example() -> octograph::domain::Result<()> {
/// let config = load_config("octograph.toml")?;
/// let writer = InfluxWriter::new(&config.influxdb, false)?;
///
/// let result = writer.write_batch(&[]).await?;
/// assert_eq!(result.points_written, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InfluxWriter {
    client: Client,
    write_url: Url,
    query_url: Option<Url>,
    auth_header: Option<String>,
    bucket: Option<String>,
    dry_run: bool,
}

impl InfluxWriter {
    /// Create a writer from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is invalid, required version
    /// fields are missing, or the HTTP client cannot be built.
    pub fn new(config: &InfluxDbConfig, dry_run: bool) -> Result<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| OctographError::Configuration(format!("Invalid influxdb.url: {e}")))?;

        let (write_url, query_url, auth_header) = match config.version {
            2 => {
                let org = required(&config.org, "influxdb.org")?;
                let bucket = required(&config.bucket, "influxdb.bucket")?;
                let token = config
                    .token
                    .as_ref()
                    .ok_or_else(|| missing("influxdb.token"))?;

                let mut write_url = endpoint(&base, &["api", "v2", "write"])?;
                write_url
                    .query_pairs_mut()
                    .append_pair("org", org)
                    .append_pair("bucket", bucket)
                    .append_pair("precision", "ns");

                let mut query_url = endpoint(&base, &["api", "v2", "query"])?;
                query_url.query_pairs_mut().append_pair("org", org);

                (
                    write_url,
                    Some(query_url),
                    Some(format!("Token {}", token.expose_secret().as_ref())),
                )
            }
            1 => {
                let database = required(&config.database, "influxdb.database")?;

                let mut write_url = endpoint(&base, &["write"])?;
                write_url
                    .query_pairs_mut()
                    .append_pair("db", database)
                    .append_pair("precision", "ns");

                let auth_header = config.username.as_ref().map(|user| {
                    let password = config
                        .password
                        .as_ref()
                        .map(|p| p.expose_secret().as_ref().to_string())
                        .unwrap_or_default();
                    let encoded =
                        general_purpose::STANDARD.encode(format!("{user}:{password}").as_bytes());
                    format!("Basic {encoded}")
                });

                (write_url, None, auth_header)
            }
            other => {
                return Err(OctographError::Configuration(format!(
                    "Unsupported influxdb.version {other}"
                )))
            }
        };

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                OctographError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            write_url,
            query_url,
            auth_header,
            bucket: config.bucket.clone(),
            dry_run,
        })
    }

    /// Write endpoint including query parameters
    pub fn write_url(&self) -> &Url {
        &self.write_url
    }

    /// Bucket targeted by 2.x writes
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Whether writes are encoded but not sent
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a Flux query and return the CSV response body (2.x only)
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueryFailed`] for 1.x targets or a non-success
    /// status, and auth/connection errors as for writes.
    pub async fn query_flux(&self, flux: &str) -> Result<String> {
        let url = self.query_url.as_ref().ok_or_else(|| {
            DatabaseError::QueryFailed("Flux queries need InfluxDB 2.x".to_string())
        })?;

        let mut request = self
            .client
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/vnd.flux")
            .header(header::ACCEPT, "application/csv")
            .body(flux.to_string());
        if let Some(auth) = &self.auth_header {
            request = request.header(header::AUTHORIZATION, auth);
        }

        let resp = request.send().await.map_err(classify_transport_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(classify_transport_error)?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DatabaseError::AuthenticationFailed(format!("Query rejected with {status}"))
                    .into())
            }
            _ => Err(DatabaseError::QueryFailed(format!(
                "Query failed with status {status}: {body}"
            ))
            .into()),
        }
    }
}

#[async_trait]
impl PointSink for InfluxWriter {
    async fn write_batch(&self, points: &[Point]) -> Result<WriteResult> {
        if points.is_empty() {
            return Ok(WriteResult {
                dry_run: self.dry_run,
                ..WriteResult::default()
            });
        }

        let batch = encode_batch(points)?;
        let result = WriteResult {
            points_received: points.len(),
            points_written: batch.lines,
            duplicates_collapsed: batch.duplicates,
            bytes: batch.body.len(),
            dry_run: self.dry_run,
        };

        if batch.duplicates > 0 {
            tracing::debug!(
                duplicates = batch.duplicates,
                "Collapsed points sharing a key"
            );
        }

        if self.dry_run {
            tracing::info!(
                lines = batch.lines,
                bytes = result.bytes,
                first_line = batch.body.lines().next().unwrap_or_default(),
                "DRY RUN: skipping InfluxDB write"
            );
            return Ok(result);
        }

        let mut request = self
            .client
            .post(self.write_url.clone())
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(batch.body);
        if let Some(auth) = &self.auth_header {
            request = request.header(header::AUTHORIZATION, auth);
        }

        let resp = request.send().await.map_err(classify_transport_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(result);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(status, &body).into())
    }
}

fn classify_transport_error(err: reqwest::Error) -> OctographError {
    if err.is_timeout() {
        DatabaseError::Timeout(err.to_string()).into()
    } else {
        DatabaseError::ConnectionFailed(err.to_string()).into()
    }
}

fn classify_status(status: StatusCode, body: &str) -> DatabaseError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DatabaseError::AuthenticationFailed(format!("Write rejected with status {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            DatabaseError::WriteFailed(format!("Throttled with status {status}"))
        }
        s if s.is_server_error() => {
            DatabaseError::WriteFailed(format!("Server error {status}: {body}"))
        }
        _ => DatabaseError::SchemaRejected(format!("Write rejected with status {status}: {body}")),
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| OctographError::Configuration(format!("influxdb.url cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(field))
}

fn missing(field: &str) -> OctographError {
    OctographError::Configuration(format!("{field} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, RetryConfig};
    use crate::domain::ErrorKind;

    fn v2_config(url: &str) -> InfluxDbConfig {
        InfluxDbConfig {
            version: 2,
            url: url.to_string(),
            token: Some(secret_string("influx-token".to_string())),
            org: Some("home".to_string()),
            bucket: Some("energy".to_string()),
            database: None,
            username: None,
            password: None,
            timeout_seconds: 5,
            retry: RetryConfig::default(),
        }
    }

    #[test]
    fn test_v2_write_url() {
        let writer = InfluxWriter::new(&v2_config("http://localhost:8086"), false).unwrap();
        assert_eq!(
            writer.write_url().as_str(),
            "http://localhost:8086/api/v2/write?org=home&bucket=energy&precision=ns"
        );
        assert_eq!(writer.auth_header.as_deref(), Some("Token influx-token"));
        assert_eq!(writer.bucket(), Some("energy"));
    }

    #[test]
    fn test_v1_write_url_and_basic_auth() {
        let mut config = v2_config("http://influx.local:8086/");
        config.version = 1;
        config.database = Some("energy".to_string());
        config.username = Some("octo".to_string());
        config.password = Some(secret_string("pw".to_string()));

        let writer = InfluxWriter::new(&config, false).unwrap();
        assert_eq!(
            writer.write_url().as_str(),
            "http://influx.local:8086/write?db=energy&precision=ns"
        );
        let expected = general_purpose::STANDARD.encode("octo:pw");
        assert_eq!(writer.auth_header, Some(format!("Basic {expected}")));
        assert!(writer.query_url.is_none());
    }

    #[test]
    fn test_missing_v2_fields() {
        let mut config = v2_config("http://localhost:8086");
        config.org = None;
        assert!(InfluxWriter::new(&config, false).is_err());
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            OctographError::from(classify_status(StatusCode::BAD_REQUEST, "")).kind(),
            ErrorKind::Schema
        );
        assert_eq!(
            OctographError::from(classify_status(StatusCode::PAYLOAD_TOO_LARGE, "")).kind(),
            ErrorKind::Schema
        );
        assert_eq!(
            OctographError::from(classify_status(StatusCode::UNPROCESSABLE_ENTITY, "")).kind(),
            ErrorKind::Schema
        );
        assert_eq!(
            OctographError::from(classify_status(StatusCode::UNAUTHORIZED, "")).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            OctographError::from(classify_status(StatusCode::SERVICE_UNAVAILABLE, "")).kind(),
            ErrorKind::Write
        );
        assert_eq!(
            OctographError::from(classify_status(StatusCode::TOO_MANY_REQUESTS, "")).kind(),
            ErrorKind::Write
        );
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        // Nothing listens here; an attempted request would fail
        let writer = InfluxWriter::new(&v2_config("http://127.0.0.1:9"), false).unwrap();
        let result = writer.write_batch(&[]).await.unwrap();
        assert_eq!(result, WriteResult::default());
    }
}

//! Watermark persistence backends
//!
//! The scheduler keeps watermarks in a [`WatermarkBook`](super::WatermarkBook)
//! and persists them through a [`WatermarkStore`]. Three backends exist:
//! in-memory (nothing survives a restart), a JSON file, and InfluxDB itself
//! where the position is derived from the last written point.

use crate::adapters::influxdb::InfluxWriter;
use crate::config::{InfluxDbConfig, StateBackend, StateConfig};
use crate::core::normalize::stream_tags;
use crate::core::state::watermark::{CycleStatus, Watermark, WatermarkBuilder};
use crate::domain::{MeterStream, OctographError, Result, StreamId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persistence adapter for stream watermarks
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Load the stored watermark for a stream, if any
    async fn load(&self, stream: &MeterStream) -> Result<Option<Watermark>>;

    /// Persist a watermark, replacing any previous one for the same stream
    async fn save(&self, watermark: &Watermark) -> Result<()>;
}

/// Create the store selected by `state.backend`
///
/// # Errors
///
/// Returns a configuration error if the InfluxDB backend is selected for a
/// 1.x target, or if the InfluxDB client cannot be built.
pub fn create_watermark_store(
    state: &StateConfig,
    influxdb: &InfluxDbConfig,
) -> Result<Arc<dyn WatermarkStore>> {
    match state.backend {
        StateBackend::Memory => {
            tracing::info!("Using in-memory watermark store");
            Ok(Arc::new(MemoryWatermarkStore::new()))
        }
        StateBackend::File => {
            tracing::info!(path = %state.path, "Using file watermark store");
            Ok(Arc::new(FileWatermarkStore::new(&state.path)))
        }
        StateBackend::InfluxDb => {
            if influxdb.version != 2 {
                return Err(OctographError::Configuration(
                    "state.backend = \"influxdb\" needs influxdb.version = 2".to_string(),
                ));
            }
            tracing::info!("Using InfluxDB watermark store");
            let writer = InfluxWriter::new(influxdb, false)?;
            Ok(Arc::new(InfluxWatermarkStore::new(Arc::new(writer))?))
        }
    }
}

/// Watermarks held in process memory
#[derive(Debug, Default)]
pub struct MemoryWatermarkStore {
    entries: Mutex<HashMap<StreamId, Watermark>>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a watermark, e.g. to simulate a previous run in tests
    pub async fn insert(&self, watermark: Watermark) {
        self.entries
            .lock()
            .await
            .insert(watermark.stream_id.clone(), watermark);
    }
}

#[async_trait]
impl WatermarkStore for MemoryWatermarkStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, stream: &MeterStream) -> Result<Option<Watermark>> {
        Ok(self.entries.lock().await.get(&stream.id).cloned())
    }

    async fn save(&self, watermark: &Watermark) -> Result<()> {
        self.insert(watermark.clone()).await;
        Ok(())
    }
}

/// Watermarks stored as a JSON object keyed by stream id
///
/// Every save rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous file intact.
#[derive(Debug)]
pub struct FileWatermarkStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileWatermarkStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Watermark>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                OctographError::State(format!(
                    "Corrupt state file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(OctographError::State(format!(
                "Failed to read state file {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }
}

#[async_trait]
impl WatermarkStore for FileWatermarkStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self, stream: &MeterStream) -> Result<Option<Watermark>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(stream.id.as_str()))
    }

    async fn save(&self, watermark: &Watermark) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut entries = self.read_all().await?;
        entries.insert(watermark.stream_id.to_string(), watermark.clone());
        let json = serde_json::to_string_pretty(&entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await.map_err(|e| {
            OctographError::State(format!("Failed to write {}: {e}", temp.display()))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            OctographError::State(format!(
                "Failed to replace state file {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(())
    }
}

/// Watermarks derived from the data already in InfluxDB
///
/// Loading asks for the last `value` written for the stream's measurement and
/// tags; the watermark is that point's time plus the stream interval. Saving
/// is a no-op because the write itself is the commit.
#[derive(Debug, Clone)]
pub struct InfluxWatermarkStore {
    writer: Arc<InfluxWriter>,
    bucket: String,
}

impl InfluxWatermarkStore {
    /// # Errors
    ///
    /// Returns a configuration error if the writer has no bucket (1.x target).
    pub fn new(writer: Arc<InfluxWriter>) -> Result<Self> {
        let bucket = writer.bucket().map(str::to_string).ok_or_else(|| {
            OctographError::Configuration("InfluxDB watermark store needs a bucket".to_string())
        })?;
        Ok(Self { writer, bucket })
    }

    /// Flux query returning the time of the last point of a stream
    pub fn last_point_query(&self, stream: &MeterStream) -> String {
        let mut query = format!(
            "from(bucket: \"{}\")\n  |> range(start: 0)\n  |> filter(fn: (r) => r._measurement == \"{}\")\n",
            flux_string(&self.bucket),
            flux_string(stream.kind.measurement()),
        );
        for (key, value) in stream_tags(stream) {
            query.push_str(&format!(
                "  |> filter(fn: (r) => r[\"{}\"] == \"{}\")\n",
                flux_string(&key),
                flux_string(&value)
            ));
        }
        query.push_str(
            "  |> filter(fn: (r) => r._field == \"value\")\n  |> last()\n  |> keep(columns: [\"_time\"])",
        );
        query
    }
}

#[async_trait]
impl WatermarkStore for InfluxWatermarkStore {
    fn name(&self) -> &'static str {
        "influxdb"
    }

    async fn load(&self, stream: &MeterStream) -> Result<Option<Watermark>> {
        let body = self.writer.query_flux(&self.last_point_query(stream)).await?;

        Ok(parse_last_time(&body)?.map(|last| {
            WatermarkBuilder::new(stream.id.clone())
                .ingested_until(last + stream.interval)
                .last_cycle_status(CycleStatus::Completed)
                .build()
        }))
    }

    async fn save(&self, watermark: &Watermark) -> Result<()> {
        tracing::debug!(
            stream_id = %watermark.stream_id,
            "InfluxDB watermark store derives positions from written points"
        );
        Ok(())
    }
}

/// Quote-safe Flux string literal content
fn flux_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${")
}

/// Latest `_time` in an InfluxDB CSV query response
///
/// Annotation rows (`#...`) and repeated header rows between tables are
/// skipped. An empty response means the stream has no points yet.
pub fn parse_last_time(csv_body: &str) -> Result<Option<DateTime<Utc>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(csv_body.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) if csv_body.trim().is_empty() => return Ok(None),
        Err(e) => {
            return Err(OctographError::State(format!(
                "Unreadable watermark query response: {e}"
            )))
        }
    };

    let Some(time_col) = headers.iter().position(|h| h == "_time") else {
        return Ok(None);
    };

    let mut latest: Option<DateTime<Utc>> = None;
    for record in reader.records() {
        let record = record
            .map_err(|e| OctographError::State(format!("Unreadable query row: {e}")))?;
        let Some(raw) = record.get(time_col) else {
            continue;
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            let ts = ts.with_timezone(&Utc);
            latest = Some(latest.map_or(ts, |l| l.max(ts)));
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, RetryConfig};
    use crate::domain::{AccountId, MeterKind, MeterPointId, SerialNumber};
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn stream() -> MeterStream {
        MeterStream::new(
            MeterKind::ElectricityConsumption,
            AccountId::new("A-1234ABCD").unwrap(),
            MeterPointId::new("1200012345678").unwrap(),
            SerialNumber::new("21L1234567").unwrap(),
        )
    }

    fn influx_config(url: &str) -> InfluxDbConfig {
        InfluxDbConfig {
            version: 2,
            url: url.to_string(),
            token: Some(secret_string("t".to_string())),
            org: Some("home".to_string()),
            bucket: Some("energy".to_string()),
            database: None,
            username: None,
            password: None,
            timeout_seconds: 5,
            retry: RetryConfig::default(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryWatermarkStore::new();
        let stream = stream();
        assert!(store.load(&stream).await.unwrap().is_none());

        let watermark = WatermarkBuilder::new(stream.id.clone())
            .ingested_until(t0())
            .build();
        store.save(&watermark).await.unwrap();

        assert_eq!(store.load(&stream).await.unwrap(), Some(watermark));
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let stream = stream();

        let watermark = WatermarkBuilder::new(stream.id.clone())
            .ingested_until(t0())
            .points_written(48)
            .build();
        FileWatermarkStore::new(&path).save(&watermark).await.unwrap();

        let reopened = FileWatermarkStore::new(&path);
        assert_eq!(reopened.load(&stream).await.unwrap(), Some(watermark));
        assert!(!reopened.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileWatermarkStore::new(dir.path().join("absent.json"));
        assert!(store.load(&stream()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = FileWatermarkStore::new(&path)
            .load(&stream())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::State);
    }

    #[test]
    fn test_parse_last_time() {
        let body = "#datatype,string,long,dateTime:RFC3339\r\n\
                    ,result,table,_time\r\n\
                    ,_result,0,2024-03-01T23:30:00Z\r\n\
                    \r\n";
        assert_eq!(
            parse_last_time(body).unwrap(),
            Some(t0() + Duration::minutes(23 * 60 + 30))
        );
        assert_eq!(parse_last_time("").unwrap(), None);
        assert_eq!(parse_last_time("\r\n").unwrap(), None);
    }

    #[test]
    fn test_flux_string_escaping() {
        assert_eq!(flux_string(r#"a"b\c${x}"#), r#"a\"b\\c\${x}"#);
    }

    #[test]
    fn test_last_point_query_filters_on_tags() {
        let writer = InfluxWriter::new(&influx_config("http://localhost:8086"), false).unwrap();
        let store = InfluxWatermarkStore::new(Arc::new(writer)).unwrap();
        let query = store.last_point_query(&stream());

        assert!(query.starts_with("from(bucket: \"energy\")"));
        assert!(query.contains("r._measurement == \"electricity\""));
        assert!(query.contains("r[\"meter\"] == \"1200012345678\""));
        assert!(query.contains("r[\"serial\"] == \"21L1234567\""));
        assert!(query.contains("|> last()"));
    }

    #[tokio::test]
    async fn test_influx_store_adds_interval_to_last_point() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/query")
            .match_query(mockito::Matcher::UrlEncoded("org".into(), "home".into()))
            .with_status(200)
            .with_header("content-type", "text/csv")
            .with_body(",result,table,_time\r\n,_result,0,2024-03-01T23:30:00Z\r\n")
            .create_async()
            .await;

        let writer = InfluxWriter::new(&influx_config(&server.url()), false).unwrap();
        let store = InfluxWatermarkStore::new(Arc::new(writer)).unwrap();

        let watermark = store.load(&stream()).await.unwrap().unwrap();
        assert_eq!(watermark.ingested_until, Some(t0() + Duration::hours(24)));
        mock.assert_async().await;
    }

    #[test]
    fn test_influx_backend_needs_v2() {
        let mut influx = influx_config("http://localhost:8086");
        influx.version = 1;
        influx.database = Some("energy".to_string());
        let state = StateConfig {
            backend: StateBackend::InfluxDb,
            ..StateConfig::default()
        };
        assert!(create_watermark_store(&state, &influx).is_err());
    }
}

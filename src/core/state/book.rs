//! In-memory watermark map backed by a persistence adapter
//!
//! The scheduler owns one [`WatermarkBook`] for the life of the process. Every
//! change is written to the store before it replaces the in-memory entry, so
//! a failed save leaves both sides at the previous position.

use crate::core::state::store::WatermarkStore;
use crate::core::state::watermark::Watermark;
use crate::domain::{MeterStream, Result, StreamId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Watermarks of all configured streams
pub struct WatermarkBook {
    store: Arc<dyn WatermarkStore>,
    entries: HashMap<StreamId, Watermark>,
}

impl WatermarkBook {
    /// Empty book; nothing is read from the store
    pub fn new(store: Arc<dyn WatermarkStore>) -> Self {
        Self {
            store,
            entries: HashMap::new(),
        }
    }

    /// Load the stored watermark of every stream
    ///
    /// Streams without a stored watermark get an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn load(store: Arc<dyn WatermarkStore>, streams: &[MeterStream]) -> Result<Self> {
        let mut book = Self::new(store);

        for stream in streams {
            let watermark = match book.store.load(stream).await? {
                Some(watermark) => {
                    tracing::info!(
                        stream_id = %stream.id,
                        ingested_until = ?watermark.ingested_until,
                        backend = book.store.name(),
                        "Loaded watermark"
                    );
                    watermark
                }
                None => {
                    tracing::debug!(stream_id = %stream.id, "No stored watermark");
                    Watermark::new(stream.id.clone())
                }
            };
            book.entries.insert(stream.id.clone(), watermark);
        }

        Ok(book)
    }

    /// Current watermark of a stream (empty if the stream is unknown)
    pub fn get(&self, stream_id: &StreamId) -> Watermark {
        self.entries
            .get(stream_id)
            .cloned()
            .unwrap_or_else(|| Watermark::new(stream_id.clone()))
    }

    /// Position the next window starts from
    pub fn position(&self, stream_id: &StreamId) -> Option<DateTime<Utc>> {
        self.entries
            .get(stream_id)
            .and_then(|watermark| watermark.ingested_until)
    }

    /// Persist a watermark, then make it current
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the save; the book is unchanged.
    pub async fn commit(&mut self, watermark: Watermark) -> Result<()> {
        self.store.save(&watermark).await?;
        self.entries.insert(watermark.stream_id.clone(), watermark);
        Ok(())
    }

    /// All known watermarks, ordered by stream id
    pub fn watermarks(&self) -> Vec<&Watermark> {
        let mut all: Vec<&Watermark> = self.entries.values().collect();
        all.sort_by(|a, b| a.stream_id.as_str().cmp(b.stream_id.as_str()));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for WatermarkBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkBook")
            .field("store", &self.store.name())
            .field("entries", &self.entries)
            .finish()
    }
}

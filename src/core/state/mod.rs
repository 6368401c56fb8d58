// Watermark tracking and persistence

pub mod book;
pub mod store;
pub mod watermark;

pub use book::WatermarkBook;
pub use store::{
    create_watermark_store, FileWatermarkStore, InfluxWatermarkStore, MemoryWatermarkStore,
    WatermarkStore,
};
pub use watermark::{CycleStatus, Watermark, WatermarkBuilder};

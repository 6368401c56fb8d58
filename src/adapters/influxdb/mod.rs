//! InfluxDB adapter
//!
//! Line protocol encoding and the HTTP writer.

pub mod client;
pub mod line_protocol;

pub use client::InfluxWriter;
pub use line_protocol::{collapse_duplicates, encode_batch, encode_point, EncodedBatch};

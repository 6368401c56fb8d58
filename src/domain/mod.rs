//! Domain models and types for Octograph.
//!
//! This module contains the core domain models, types, and rules shared by the
//! provider client, the normalizer, the writer and the scheduler.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`StreamId`], [`AccountId`], [`MeterPointId`], [`SerialNumber`])
//! - **Stream configuration** ([`MeterStream`], [`MeterKind`], [`Tariff`])
//! - **Readings and points** ([`RawInterval`], [`Point`], [`PointKey`])
//! - **Error types** ([`OctographError`], [`ProviderError`], [`DatabaseError`], [`ErrorKind`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so a serial number cannot be passed where
//! a meter point is expected:
//!
//! ```rust
//! use octograph::domain::{MeterPointId, SerialNumber};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mpan = MeterPointId::new("1200012345678")?;
//! let serial = SerialNumber::new("21L1234567")?;
//!
//! // This won't compile
//! // let wrong: MeterPointId = serial;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, OctographError>`]:
//!
//! ```rust
//! use octograph::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = octograph::config::OctographConfig::from_file("octograph.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod point;
pub mod reading;
pub mod result;
pub mod stream;

// Re-export commonly used types for convenience
pub use errors::{DatabaseError, ErrorKind, OctographError, ProviderError};
pub use ids::{AccountId, MeterPointId, SerialNumber, StreamId};
pub use point::{FieldValue, Point, PointKey};
pub use reading::RawInterval;
pub use result::Result;
pub use stream::{
    GasConversion, LowRateWindow, MeterKind, MeterStream, StandingCharge, Tariff, TariffCodes, Unit,
};

//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that name a meter stream. Each type
//! rejects empty values and control characters so configuration mistakes
//! surface at startup rather than as broken line protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $label, ", rejecting blank values and control characters")]
            pub fn new(id: impl Into<String>) -> Result<Self, String> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(concat!($label, " cannot be empty").to_string());
                }
                if trimmed.chars().any(char::is_control) {
                    return Err(format!(
                        concat!($label, " '{}' contains control characters"),
                        trimmed.escape_debug()
                    ));
                }
                Ok(Self(trimmed.to_string()))
            }

            #[doc = concat!("Returns the ", $label, " as a string slice")]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of one ingested stream, unique within a configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use octograph::domain::ids::StreamId;
    ///
    /// let id = StreamId::new("electricity-1200012345678").unwrap();
    /// assert_eq!(id.as_str(), "electricity-1200012345678");
    /// ```
    StreamId,
    "Stream ID"
);

string_id!(
    /// Provider account number (e.g. `A-1234ABCD`)
    AccountId,
    "Account ID"
);

string_id!(
    /// Meter point identifier: MPAN for electricity, MPRN for gas
    MeterPointId,
    "Meter point ID"
);

string_id!(
    /// Meter serial number
    SerialNumber,
    "Serial number"
);

impl StreamId {
    /// Default id for a stream: `<measurement>-<meter point>`
    pub fn derived(measurement: &str, meter_point: &MeterPointId) -> Self {
        Self(format!("{measurement}-{meter_point}"))
    }
}

//! Normalized time-series points
//!
//! A [`Point`] is the unit written to the database. Its identity is the
//! [`PointKey`]: measurement, tag set and timestamp. Writing a point whose key
//! already exists overwrites the stored fields, which is what makes
//! re-ingesting an interval safe.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Field value types used by this crate
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    String(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// Identity of a point in the database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

/// A normalized measurement ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Float field by name
    pub fn float_field(&self, key: &str) -> Option<f64> {
        match self.fields.get(key) {
            Some(FieldValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Identity key; fields never take part in it
    pub fn key(&self) -> PointKey {
        PointKey {
            measurement: self.measurement.clone(),
            tags: self.tags.clone(),
            timestamp: self.timestamp,
        }
    }
}

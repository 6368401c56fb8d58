//! InfluxDB line protocol encoding
//!
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2="text" timestamp_ns
//! ```
//!
//! Tags and fields come from ordered maps, so encoding the same point twice
//! always yields the same line.

use crate::domain::{DatabaseError, FieldValue, Point, PointKey, Result};
use std::collections::HashMap;

/// Escape a measurement name: backslashes, commas and spaces
pub fn escape_measurement(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
}

/// Escape a tag key, tag value or field key
///
/// Backslashes are doubled first so a trailing `\` cannot escape the
/// separator that follows.
pub fn escape_key(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Format a field value
///
/// Floats use the shortest representation that round-trips; strings are
/// double-quoted with `\` and `"` escaped.
pub fn format_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::String(v) => {
            let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
    }
}

/// Encode one point as a single line (no trailing newline)
///
/// # Errors
///
/// Returns [`DatabaseError::SchemaRejected`] for a point without fields, with a
/// non-finite float, with a line break in a name or tag, or with a timestamp
/// outside the nanosecond range.
pub fn encode_point(point: &Point) -> Result<String> {
    let names = std::iter::once(point.measurement.as_str())
        .chain(point.tags.iter().flat_map(|(k, v)| [k.as_str(), v.as_str()]))
        .chain(point.fields.keys().map(String::as_str));
    for name in names {
        if name.contains(['\n', '\r']) {
            return Err(DatabaseError::SchemaRejected(format!(
                "Line break in '{}' of point in '{}'",
                name.escape_debug(),
                point.measurement
            ))
            .into());
        }
    }

    if point.fields.is_empty() {
        return Err(DatabaseError::SchemaRejected(format!(
            "Point in '{}' has no fields",
            point.measurement
        ))
        .into());
    }

    let timestamp_ns = point.timestamp.timestamp_nanos_opt().ok_or_else(|| {
        DatabaseError::SchemaRejected(format!("Timestamp {} out of range", point.timestamp))
    })?;

    let mut line = escape_measurement(&point.measurement);

    for (key, value) in &point.tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');

    for (i, (key, value)) in point.fields.iter().enumerate() {
        if let FieldValue::Float(v) = value {
            if !v.is_finite() {
                return Err(DatabaseError::SchemaRejected(format!(
                    "Field '{key}' is not finite"
                ))
                .into());
            }
        }
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&format_field_value(value));
    }

    line.push(' ');
    line.push_str(&timestamp_ns.to_string());

    Ok(line)
}

/// Keep one point per [`PointKey`]
///
/// A later point replaces an earlier one with the same key but takes its
/// position, so the result keeps the order of first appearance.
pub fn collapse_duplicates(points: &[Point]) -> Vec<&Point> {
    let mut index: HashMap<PointKey, usize> = HashMap::with_capacity(points.len());
    let mut kept: Vec<&Point> = Vec::with_capacity(points.len());

    for point in points {
        match index.get(&point.key()) {
            Some(&slot) => kept[slot] = point,
            None => {
                index.insert(point.key(), kept.len());
                kept.push(point);
            }
        }
    }

    kept
}

/// A batch ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    /// Newline-separated lines
    pub body: String,
    /// Number of lines in `body`
    pub lines: usize,
    /// Points dropped by [`collapse_duplicates`]
    pub duplicates: usize,
}

/// Collapse duplicates and encode the rest
pub fn encode_batch(points: &[Point]) -> Result<EncodedBatch> {
    let kept = collapse_duplicates(points);
    let duplicates = points.len() - kept.len();

    let lines = kept
        .into_iter()
        .map(encode_point)
        .collect::<Result<Vec<_>>>()?;

    Ok(EncodedBatch {
        lines: lines.len(),
        body: lines.join("\n"),
        duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap()
    }

    #[test]
    fn test_field_value_float() {
        assert_eq!(format_field_value(&FieldValue::Float(0.1)), "0.1");
        assert_eq!(format_field_value(&FieldValue::Float(1.0)), "1");
        assert_eq!(format_field_value(&FieldValue::Float(0.000123)), "0.000123");
    }

    #[test]
    fn test_field_value_string_with_quotes() {
        let v = FieldValue::String("say \"hi\" \\o/".to_string());
        assert_eq!(format_field_value(&v), "\"say \\\"hi\\\" \\\\o/\"");
    }

    #[test]
    fn test_encode_point() {
        let point = Point::new("electricity", ts())
            .tag("serial", "21L1234567")
            .tag("account", "A-1234ABCD")
            .tag("meter", "1200012345678")
            .field("value", 0.25)
            .field("raw_unit", "Wh");

        assert_eq!(
            encode_point(&point).unwrap(),
            "electricity,account=A-1234ABCD,meter=1200012345678,serial=21L1234567 \
             raw_unit=\"Wh\",value=0.25 1709253000000000000"
        );
    }

    #[test]
    fn test_encode_escapes_special_chars() {
        let point = Point::new("my measurement", ts())
            .tag("tag key", "a,b=c")
            .field("field=key", 1.5);

        assert_eq!(
            encode_point(&point).unwrap(),
            "my\\ measurement,tag\\ key=a\\,b\\=c field\\=key=1.5 1709253000000000000"
        );
    }

    #[test]
    fn test_encode_escapes_backslashes() {
        let point = Point::new("gas", ts())
            .tag("meter", "trailing\\")
            .tag("serial", "a\\,b")
            .field("value", 1.0);

        assert_eq!(
            encode_point(&point).unwrap(),
            "gas,meter=trailing\\\\,serial=a\\\\\\,b value=1 1709253000000000000"
        );
    }

    #[test]
    fn test_encode_rejects_line_breaks_in_tags() {
        let point = Point::new("gas", ts())
            .tag("meter", "m\nother,meter=x value=9")
            .field("value", 1.0);
        let err = encode_point(&point).unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::Schema);
    }

    #[test]
    fn test_encode_rejects_bad_points() {
        let empty = Point::new("gas", ts()).tag("meter", "m");
        assert!(encode_point(&empty).is_err());

        let nan = Point::new("gas", ts()).field("value", f64::NAN);
        let err = encode_point(&nan).unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::Schema);
    }

    #[test]
    fn test_collapse_duplicates_last_wins() {
        let later = ts() + chrono::Duration::minutes(30);
        let points = vec![
            Point::new("electricity", ts()).tag("meter", "m").field("value", 1.0),
            Point::new("electricity", later).tag("meter", "m").field("value", 2.0),
            Point::new("electricity", ts()).tag("meter", "m").field("value", 3.0),
        ];

        let kept = collapse_duplicates(&points);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].float_field("value"), Some(3.0));
        assert_eq!(kept[1].float_field("value"), Some(2.0));
    }

    #[test]
    fn test_encode_batch_is_deterministic() {
        let points = vec![
            Point::new("gas", ts()).tag("meter", "m").field("value", 1.0),
            Point::new("gas", ts()).tag("meter", "m").field("value", 1.5),
        ];

        let first = encode_batch(&points).unwrap();
        let second = encode_batch(&points).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.lines, 1);
        assert_eq!(first.duplicates, 1);
        assert_eq!(first.body, "gas,meter=m value=1.5 1709253000000000000");
    }
}

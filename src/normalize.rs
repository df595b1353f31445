//! Value normalization.
//!
//! Turns raw JSON payload values into bound [`Value`]s before they reach
//! SQL: arrays are stored as JSON text, the two placeholder timestamps
//! clients send for "no bound" become NULL, and strict ISO-8601 strings
//! become real timestamps.

use crate::ast::{Row, SearchFilters, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use nom::{
    IResult,
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, recognize},
    sequence::tuple,
};
use serde_json::Value as JsonValue;

/// Placeholder sent by clients for an open lower bound.
pub const MIN_ISO_DATE: &str = "0000-00-00T00:00:00.000Z";
/// Placeholder sent by clients for an open upper bound.
pub const MAX_ISO_DATE: &str = "9999-00-00T00:00:00.000Z";

fn digits<'a>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    take_while_m_n(n, n, |c: char| c.is_ascii_digit())
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ`, nothing more, nothing less.
fn iso_timestamp(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        digits(4),
        char('-'),
        digits(2),
        char('-'),
        digits(2),
        char('T'),
        digits(2),
        char(':'),
        digits(2),
        char(':'),
        digits(2),
        char('.'),
        digits(3),
        char('Z'),
    )))(input)
}

/// Parse a strict ISO-8601 UTC timestamp with millisecond precision.
pub fn parse_iso_date(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    all_consuming(iso_timestamp)(trimmed).ok()?;
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.3fZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Normalize one raw value into a bound value.
pub fn normalize(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        JsonValue::String(s) if s == MIN_ISO_DATE || s == MAX_ISO_DATE => Value::Null,
        JsonValue::String(s) => match parse_iso_date(s) {
            Some(dt) => Value::DateTime(dt),
            None => Value::String(s.clone()),
        },
        JsonValue::Array(_) | JsonValue::Object(_) => Value::String(value.to_string()),
    }
}

/// Normalize every field of a write payload, keeping field order.
pub fn normalize_body(body: &Row) -> Vec<(String, Value)> {
    body.iter()
        .map(|(key, value)| (key.clone(), normalize(value)))
        .collect()
}

/// Normalize every leaf of a filter set: scalars, list elements and range bounds.
pub fn normalize_filters(filters: &SearchFilters) -> SearchFilters<Value> {
    filters.clone().map_values(|value| normalize(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Filter;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_arrays_become_json_text() {
        assert_eq!(normalize(&json!(["a", 1])), Value::String("[\"a\",1]".to_string()));
    }

    #[test]
    fn test_sentinel_dates_become_null() {
        assert_eq!(normalize(&json!(MIN_ISO_DATE)), Value::Null);
        assert_eq!(normalize(&json!(MAX_ISO_DATE)), Value::Null);
        assert_eq!(normalize(&JsonValue::Null), Value::Null);
    }

    #[test]
    fn test_iso_strings_become_dates() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 15, 9, 45, 0).unwrap();
        assert_eq!(
            normalize(&json!("2023-01-15T09:45:00.000Z")),
            Value::DateTime(expected)
        );
        assert_eq!(
            normalize(&json!("  2023-01-15T09:45:00.000Z ")),
            Value::DateTime(expected)
        );
    }

    #[test]
    fn test_near_dates_stay_strings() {
        for s in [
            "2023-01-15",
            "2023-01-15T09:45:00Z",
            "2023-02-30T00:00:00.000Z",
            "2023-01-15T09:45:00.000Zx",
            "hello",
        ] {
            assert_eq!(normalize(&json!(s)), Value::String(s.to_string()), "{}", s);
        }
    }

    #[test]
    fn test_numbers() {
        assert_eq!(normalize(&json!(5)), Value::Int(5));
        assert_eq!(normalize(&json!(2.5)), Value::Float(2.5));
        assert_eq!(normalize(&json!(true)), Value::Bool(true));
    }

    #[test]
    fn test_normalize_filters_recurses() {
        let filters = SearchFilters::new()
            .range("created", Some(json!(MIN_ISO_DATE)), Some(json!("2020-01-01T00:00:00.000Z")))
            .one_of("id", vec![json!(1), json!("x")]);
        let normalized = normalize_filters(&filters);
        assert_eq!(
            normalized.filters[0],
            Filter::Range {
                key: "created".into(),
                low: Some(Value::Null),
                high: Some(Value::DateTime(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())),
            }
        );
        assert_eq!(
            normalized.filters[1],
            Filter::OneOf {
                key: "id".into(),
                values: vec![Value::Int(1), Value::from("x")],
            }
        );
    }
}

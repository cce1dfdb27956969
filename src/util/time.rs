//! Epoch-millisecond timestamps.
//!
//! Source files carry timestamps as numbers, numeric strings or RFC 3339
//! dates. Everything in the canonical bundle is epoch milliseconds.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Current time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Coerce a JSON value into epoch milliseconds.
///
/// Accepts finite numbers, numeric strings and RFC 3339 date strings.
/// Anything else (null, NaN, booleans, garbage) yields `None`.
#[must_use]
pub fn coerce_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => parse_millis_str(s.trim()),
        _ => None,
    }
}

fn parse_millis_str(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    if let Ok(f) = s.parse::<f64>() {
        return f.is_finite().then_some(f as i64);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// Start of the UTC calendar day containing `millis`.
#[must_use]
pub fn day_start(millis: i64) -> Option<i64> {
    let dt = DateTime::<Utc>::from_timestamp_millis(millis)?;
    let midnight = dt.date_naive().and_hms_opt(0, 0, 0)?;
    Some(midnight.and_utc().timestamp_millis())
}

/// Resolved `created` / `updated` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub created: i64,
    pub updated: i64,
}

impl Timings {
    /// Back-fill timestamps of an already-stored record.
    ///
    /// An invalid `updated` becomes `now`; a missing `created` takes the
    /// (possibly regenerated) `updated`; `updated` is then refreshed to `now`.
    #[must_use]
    pub fn backfill(created: Option<&Value>, updated: Option<&Value>, now: i64) -> Self {
        let previous = updated.and_then(coerce_millis).unwrap_or(now);
        let created = created.and_then(coerce_millis).unwrap_or(previous);
        Self {
            created,
            updated: now,
        }
    }

    /// Timings for a freshly created record.
    #[must_use]
    pub fn fresh(created: Option<&Value>, now: i64) -> Self {
        Self {
            created: created.and_then(coerce_millis).unwrap_or(now),
            updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_numbers_and_strings() {
        assert_eq!(coerce_millis(&json!(1_545_363_890_469_i64)), Some(1_545_363_890_469));
        assert_eq!(coerce_millis(&json!(12.9)), Some(12));
        assert_eq!(coerce_millis(&json!("42")), Some(42));
        assert_eq!(
            coerce_millis(&json!("2019-02-02T21:58:25.467Z")),
            Some(1_549_144_705_467)
        );
    }

    #[test]
    fn rejects_non_timestamps() {
        assert_eq!(coerce_millis(&json!(null)), None);
        assert_eq!(coerce_millis(&json!("yesterday")), None);
        assert_eq!(coerce_millis(&json!(true)), None);
        assert_eq!(coerce_millis(&json!("")), None);
    }

    #[test]
    fn day_start_truncates_to_utc_midnight() {
        // 2019-02-02T21:58:25.467Z
        let start = day_start(1_549_144_705_467).unwrap();
        assert_eq!(start, 1_549_065_600_000);
        assert_eq!(day_start(start), Some(start));
    }

    #[test]
    fn backfill_regenerates_missing_updated() {
        let t = Timings::backfill(None, Some(&json!("nope")), 1000);
        assert_eq!(t, Timings { created: 1000, updated: 1000 });
    }

    #[test]
    fn backfill_copies_updated_into_missing_created() {
        let t = Timings::backfill(None, Some(&json!(500)), 1000);
        assert_eq!(t, Timings { created: 500, updated: 1000 });
    }

    #[test]
    fn backfill_keeps_existing_created() {
        let t = Timings::backfill(Some(&json!(100)), Some(&json!(500)), 1000);
        assert_eq!(t, Timings { created: 100, updated: 1000 });
    }
}
